//! Metadata codec: find, decode and re-embed generation parameters.
//!
//! | Container | Where the text lives | Module |
//! |---|---|---|
//! | **PNG** | first `tEXt`/`iTXt` chunk that looks like an annotation | [`png_text`] |
//! | **JPEG** | EXIF `UserComment` (tag 37510) inside APP1, or a raw `Steps:` run | [`exif`] |
//! | **PNG (write)** | one fresh `tEXt` chunk right before `IEND` | [`png_writer`] |
//!
//! Both readers sit on top of the container walkers in [`chunks`].
//!
//! Reading is best-effort. The `try_*` functions report why nothing was
//! found; [`read_annotation`] folds every failure into `None` so a broken
//! file never takes the caller down with it.

pub mod chunks;
pub mod exif;
pub mod png_text;
pub mod png_writer;

use crate::format::ImageFormat;
use thiserror::Error;

pub use png_writer::{crc32, write_annotation};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("bad file signature")]
    BadSignature,
    #[error("container truncated at byte {offset}")]
    Truncated { offset: usize },
    #[error("expected a JPEG marker at byte {offset}")]
    BadMarker { offset: usize },
    #[error("unknown TIFF byte order")]
    BadByteOrder,
    #[error("bad TIFF magic number {0} (expected 42)")]
    BadMagic(u16),
    #[error("IFD chain loops back to offset {0}")]
    LoopingIfd(usize),
    #[error("PNG stream has no IEND chunk")]
    MissingTerminator,
    #[error("chunk payload of {0} bytes does not fit a PNG length field")]
    Oversized(usize),
    #[error("unsupported image format: {0}")]
    Unsupported(ImageFormat),
}

/// Locate the raw annotation text for an image, reporting why it failed.
///
/// `Ok(None)` means the container parsed cleanly but carried no annotation.
pub fn try_read_annotation(
    bytes: &[u8],
    format: ImageFormat,
) -> Result<Option<String>, CodecError> {
    match format {
        ImageFormat::Png => png_text::extract(bytes),
        ImageFormat::Jpeg => exif::extract(bytes),
        ImageFormat::Unknown => Err(CodecError::Unsupported(format)),
    }
}

/// Locate the raw annotation text for an image. Any failure is `None`.
pub fn read_annotation(bytes: &[u8], format: ImageFormat) -> Option<String> {
    try_read_annotation(bytes, format).ok().flatten()
}
