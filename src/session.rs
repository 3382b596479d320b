//! The single "current image" an editor works on.
//!
//! A session holds at most one loaded image. Loading another replaces it
//! wholesale: bytes, detected format, raw annotation and parsed fields.
//! Edits go through [`Session::prompt_mut`]; [`Session::save`] re-encodes
//! the original bytes with the edited annotation.
//!
//! ```text
//! load(bytes) → detect format → read annotation → parse → LoadedImage
//! edit ParsedPrompt in place
//! save() → to_annotation() → png_writer → SavedImage { file_name, bytes }
//! ```
//!
//! Saving with nothing loaded is a no-op (`Ok(None)`). Only PNG can be
//! written back; saving a JPEG is an `Unsupported` error.

use crate::codec::{self, CodecError};
use crate::config::SaveConfig;
use crate::format::ImageFormat;
use crate::prompt::ParsedPrompt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An image and everything read from it.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    /// Display name, as supplied by whoever loaded it.
    pub name: String,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
    /// Annotation text as found in the file, `None` if there was none.
    pub raw: Option<String>,
    pub parsed: ParsedPrompt,
    /// Why no annotation was found, when the container itself was at fault.
    pub diagnostic: Option<CodecError>,
}

impl LoadedImage {
    fn decode(name: &str, content_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let format = ImageFormat::detect(content_type, name, &bytes);
        let (raw, diagnostic) = match codec::try_read_annotation(&bytes, format) {
            Ok(raw) => (raw, None),
            Err(e) => (None, Some(e)),
        };
        let parsed = ParsedPrompt::from_raw(raw.as_deref());
        Self {
            name: name.to_string(),
            format,
            bytes,
            raw,
            parsed,
            diagnostic,
        }
    }

    pub fn has_annotation(&self) -> bool {
        self.raw.is_some()
    }
}

/// A re-encoded image ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl SavedImage {
    /// Write into `dir` under the suggested file name.
    pub fn write_to_dir(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    current: Option<LoadedImage>,
    naming: SaveConfig,
}

impl Session {
    pub fn new(naming: SaveConfig) -> Self {
        Self {
            current: None,
            naming,
        }
    }

    /// Load an image from memory, replacing whatever was loaded before.
    pub fn load(
        &mut self,
        name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> &LoadedImage {
        self.current.insert(LoadedImage::decode(name, content_type, bytes))
    }

    /// Load an image from disk. The file name doubles as display name.
    pub fn load_path(&mut self, path: &Path) -> Result<&LoadedImage, SessionError> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.load(&name, None, bytes))
    }

    pub fn current(&self) -> Option<&LoadedImage> {
        self.current.as_ref()
    }

    /// Editable fields of the current image.
    pub fn prompt_mut(&mut self) -> Option<&mut ParsedPrompt> {
        self.current.as_mut().map(|image| &mut image.parsed)
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// Re-encode the current image with its edited annotation.
    pub fn save(&self) -> Result<Option<SavedImage>, CodecError> {
        let Some(image) = &self.current else {
            return Ok(None);
        };
        if image.format != ImageFormat::Png {
            return Err(CodecError::Unsupported(image.format));
        }
        let bytes = codec::write_annotation(&image.bytes, &image.parsed.to_annotation())?;
        Ok(Some(SavedImage {
            file_name: edited_file_name(&image.name, &self.naming),
            bytes,
        }))
    }
}

/// `photo.png` → `photo_edit.png`, split at the last dot.
///
/// A name without a dot keeps its whole self as base and takes the
/// extension of the configured fallback name.
pub fn edited_file_name(name: &str, naming: &SaveConfig) -> String {
    let name = if name.is_empty() {
        naming.fallback_name.as_str()
    } else {
        name
    };
    let fallback_ext = naming
        .fallback_name
        .rfind('.')
        .map_or(".png", |i| &naming.fallback_name[i..]);
    let (base, ext) = match name.rfind('.') {
        Some(i) => (&name[..i], &name[i..]),
        None => (name, fallback_ext),
    };
    format!("{base}{}{ext}", naming.edit_suffix)
}
