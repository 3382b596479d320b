//! # Prompt Reader
//!
//! Reads the generation parameters that image generators embed in their
//! output files (prompt, negative prompt, sampler settings), lets you edit
//! them, and writes them back into a new PNG.
//!
//! # Pipeline
//!
//! ```text
//! file bytes ─┬─ PNG  → chunk walker → first annotation-like tEXt/iTXt ─┐
//!             └─ JPEG → marker walker → EXIF/TIFF → UserComment ────────┴→ raw text
//! raw text → prompt::parse → ParsedPrompt (edited in place)
//! ParsedPrompt → to_annotation → png_writer → new PNG bytes
//! ```
//!
//! Reading is best-effort throughout: a truncated chunk, a bogus TIFF
//! header or an unknown format all end up as "no annotation", never as a
//! panic. The reason is kept around for anyone who wants to show it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`codec`] | Container walking, annotation lookup (PNG + JPEG/EXIF), PNG re-encoding |
//! | [`prompt`] | Annotation text ⇄ structured prompt, negative prompt and parameters |
//! | [`format`] | PNG/JPEG detection from content type, file name or magic bytes |
//! | [`session`] | The current image: load, edit, save with an `_edit` file name |
//! | [`config`] | Optional `prompt-reader.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Sniff the content, not the keyword
//!
//! PNG text chunks are matched on their content (`Steps:` or
//! `Negative prompt:`), not on the conventional `parameters` keyword. This
//! picks up files from tools that use a different keyword or none at all,
//! at the cost of occasionally matching a chunk that merely mentions those
//! labels.
//!
//! ## PNG only on the way out
//!
//! Edited annotations are written into PNG files only. All old `tEXt` and
//! `iTXt` chunks are dropped and exactly one new `tEXt` chunk goes in right
//! before `IEND`, so saving repeatedly never piles up stale copies.

pub mod codec;
pub mod config;
pub mod format;
pub mod output;
pub mod prompt;
pub mod session;

pub use codec::{CodecError, read_annotation, try_read_annotation, write_annotation};
pub use format::ImageFormat;
pub use prompt::{ParamError, ParamValue, ParsedPrompt};
pub use session::{LoadedImage, SavedImage, Session};

#[cfg(test)]
pub(crate) mod test_helpers;
