//! Annotation lookup in PNG text chunks.
//!
//! Generators store their parameters in a `tEXt` chunk (sometimes `iTXt`),
//! usually keyed `parameters`. Rather than trusting the keyword, the chunk
//! content is sniffed for the labels every annotation of this style carries.
//! The first text chunk that matches wins.
//!
//! The whole payload is decoded as text, keyword and all. For `iTXt` this
//! also pulls in the compression flag and language tag, which is fine for
//! the uncompressed, untranslated chunks generators actually write.

use super::CodecError;
use super::chunks::png_chunks;

/// Case-sensitive labels whose presence marks a chunk as an annotation.
const ANNOTATION_LABELS: [&str; 2] = ["Steps:", "Negative prompt:"];

/// Whether decoded chunk text looks like a generation annotation.
pub fn looks_like_annotation(text: &str) -> bool {
    ANNOTATION_LABELS.iter().any(|label| text.contains(label))
}

/// Return the text of the first annotation-like `tEXt`/`iTXt` chunk.
///
/// Errors only when the stream is malformed before a match is found.
pub fn extract(data: &[u8]) -> Result<Option<String>, CodecError> {
    for chunk in png_chunks(data)? {
        let chunk = chunk?;
        if !chunk.is_text() {
            continue;
        }
        let text = String::from_utf8_lossy(chunk.payload);
        if looks_like_annotation(&text) {
            return Ok(Some(text.into_owned()));
        }
    }
    Ok(None)
}

/// Best-effort variant of [`extract`]: malformed input is simply `None`.
pub fn find_annotation(data: &[u8]) -> Option<String> {
    extract(data).ok().flatten()
}
