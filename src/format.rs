//! Which container a file is, from its declared type, name or first bytes.
//!
//! The declared content type wins when it is one we know. Otherwise the
//! magic bytes decide, and the file extension only when the bytes are not
//! recognized.

use crate::codec::chunks::{JPEG_SOI, PNG_SIGNATURE};
use serde::Serialize;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Unknown,
}

impl ImageFormat {
    pub fn from_content_type(content_type: &str) -> Self {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Self::Jpeg,
            _ => Self::Unknown,
        }
    }

    pub fn from_file_name(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" | "jpe" | "jfif" => Self::Jpeg,
            _ => Self::Unknown,
        }
    }

    pub fn sniff(bytes: &[u8]) -> Self {
        if bytes.starts_with(&PNG_SIGNATURE) {
            Self::Png
        } else if bytes.starts_with(&JPEG_SOI) {
            Self::Jpeg
        } else {
            Self::Unknown
        }
    }

    /// Resolve a format: declared content type, then magic bytes, then file name.
    pub fn detect(content_type: Option<&str>, name: &str, bytes: &[u8]) -> Self {
        [
            content_type.map_or(Self::Unknown, Self::from_content_type),
            Self::sniff(bytes),
            Self::from_file_name(name),
        ]
        .into_iter()
        .find(|f| *f != Self::Unknown)
        .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Unknown => "unknown",
        })
    }
}
