//! Re-embed an annotation into a PNG stream.
//!
//! Every existing `tEXt`/`iTXt` chunk is dropped and exactly one new `tEXt`
//! chunk is written right before `IEND`. All other chunks are copied
//! byte-for-byte, in order. Running the writer twice leaves one text chunk.
//!
//! The new payload is the annotation's UTF-8 bytes with no keyword prefix,
//! which is what the readers in this crate (and the tools producing these
//! files) expect to get back verbatim.

use super::CodecError;
use super::chunks::{PNG_SIGNATURE, png_chunks};
use std::sync::LazyLock;

/// CRC-32 lookup table for the reflected polynomial 0xEDB88320.
static CRC_TABLE: LazyLock<[u32; 256]> = LazyLock::new(make_crc_table);

fn make_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    for (n, slot) in table.iter_mut().enumerate() {
        let mut c = n as u32;
        for _ in 0..8 {
            c = if c & 1 != 0 {
                0xEDB8_8320 ^ (c >> 1)
            } else {
                c >> 1
            };
        }
        *slot = c;
    }
    table
}

fn update_crc(mut crc: u32, bytes: &[u8]) -> u32 {
    let table = &*CRC_TABLE;
    for &byte in bytes {
        crc = table[((crc ^ u32::from(byte)) & 0xFF) as usize] ^ (crc >> 8);
    }
    crc
}

/// Standard CRC-32 (as used by PNG, zlib and gzip).
pub fn crc32(bytes: &[u8]) -> u32 {
    update_crc(u32::MAX, bytes) ^ u32::MAX
}

/// CRC of a chunk: computed over the type tag followed by the payload.
pub fn chunk_crc(kind: &[u8; 4], payload: &[u8]) -> u32 {
    update_crc(update_crc(u32::MAX, kind), payload) ^ u32::MAX
}

/// Append a complete chunk (length, type, payload, CRC) to `out`.
pub fn encode_chunk(kind: &[u8; 4], payload: &[u8], out: &mut Vec<u8>) -> Result<(), CodecError> {
    let length = u32::try_from(payload.len())
        .ok()
        .filter(|&len| len <= i32::MAX as u32)
        .ok_or(CodecError::Oversized(payload.len()))?;
    out.reserve(12 + payload.len());
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out.extend_from_slice(&chunk_crc(kind, payload).to_be_bytes());
    Ok(())
}

/// Rebuild `png` with `annotation` as its only text chunk.
///
/// Fails on a malformed chunk stream or one that never reaches `IEND`.
pub fn write_annotation(png: &[u8], annotation: &str) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(png.len() + annotation.len() + 12);
    out.extend_from_slice(&PNG_SIGNATURE);

    for chunk in png_chunks(png)? {
        let chunk = chunk?;
        if chunk.is_text() {
            continue;
        }
        if chunk.is_end() {
            encode_chunk(b"tEXt", annotation.as_bytes(), &mut out)?;
            out.extend_from_slice(chunk.raw);
            return Ok(out);
        }
        out.extend_from_slice(chunk.raw);
    }

    Err(CodecError::MissingTerminator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::png_text;
    use crate::test_helpers::*;

    // =========================================================================
    // CRC-32
    // =========================================================================

    #[test]
    fn crc_of_empty_input_is_zero() {
        assert_eq!(crc32(&[]), 0);
    }

    #[test]
    fn crc_table_matches_reference_values() {
        assert_eq!(CRC_TABLE[0], 0);
        assert_eq!(CRC_TABLE[1], 0x7707_3096);
        assert_eq!(CRC_TABLE[255], 0x2D02_EF8D);
        assert_eq!(make_crc_table(), *CRC_TABLE);
    }

    #[test]
    fn crc_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn iend_chunk_crc() {
        assert_eq!(chunk_crc(b"IEND", &[]), 0xAE42_6082);
        assert_eq!(chunk_crc(b"tEXt", b"abc"), crc32(b"tEXtabc"));
    }

    // =========================================================================
    // Chunk encoding
    // =========================================================================

    #[test]
    fn encode_chunk_frames_payload() {
        let mut out = Vec::new();
        encode_chunk(b"tEXt", b"hey", &mut out).unwrap();
        assert_eq!(&out[0..4], &3u32.to_be_bytes());
        assert_eq!(&out[4..8], b"tEXt");
        assert_eq!(&out[8..11], b"hey");
        assert_eq!(&out[11..15], &crc32(b"tEXthey").to_be_bytes());
    }

    // =========================================================================
    // Rewriting
    // =========================================================================

    #[test]
    fn written_annotation_reads_back_exactly() {
        let png = png_with_chunks(&[]);
        let text = "a harbor at dawn\nNegative prompt: fog\nSteps: 30, Sampler: Euler a";
        let out = write_annotation(&png, text).unwrap();
        assert_eq!(png_text::find_annotation(&out), Some(text.to_string()));
    }

    #[test]
    fn text_chunk_lands_right_before_iend() {
        let png = png_with_chunks(&[]);
        let out = write_annotation(&png, "Steps: 1").unwrap();
        let kinds = chunk_kinds(&out);
        assert_eq!(kinds, vec![*b"IHDR", *b"IDAT", *b"tEXt", *b"IEND"]);
    }

    #[test]
    fn old_text_chunks_are_all_replaced() {
        let png = png_with_chunks(&[
            (b"tEXt", b"parameters\0old one"),
            (b"iTXt", b"Comment\0\0\0\0\0old two"),
            (b"tEXt", b"Software\0x"),
        ]);
        let out = write_annotation(&png, "Steps: 2").unwrap();
        let texts: Vec<Vec<u8>> = png_chunks(&out)
            .unwrap()
            .map(Result::unwrap)
            .filter(|c| c.is_text())
            .map(|c| c.payload.to_vec())
            .collect();
        assert_eq!(texts, vec![b"Steps: 2".to_vec()]);
    }

    #[test]
    fn writing_twice_keeps_one_text_chunk() {
        let png = png_with_chunks(&[]);
        let once = write_annotation(&png, "Steps: 1").unwrap();
        let twice = write_annotation(&once, "Steps: 2").unwrap();
        let kinds = chunk_kinds(&twice);
        assert_eq!(kinds.iter().filter(|k| *k == b"tEXt").count(), 1);
        assert_eq!(png_text::find_annotation(&twice), Some("Steps: 2".to_string()));
    }

    #[test]
    fn other_chunks_are_copied_verbatim() {
        let png = png_with_chunks(&[(b"gAMA", &[0, 0, 0xB1, 0x8F]), (b"tEXt", b"x")]);
        let out = write_annotation(&png, "").unwrap();
        let originals: Vec<Vec<u8>> = png_chunks(&png)
            .unwrap()
            .map(Result::unwrap)
            .filter(|c| !c.is_text())
            .map(|c| c.raw.to_vec())
            .collect();
        let copied: Vec<Vec<u8>> = png_chunks(&out)
            .unwrap()
            .map(Result::unwrap)
            .filter(|c| !c.is_text())
            .map(|c| c.raw.to_vec())
            .collect();
        assert_eq!(originals, copied);
    }

    #[test]
    fn every_output_crc_is_valid() {
        let png = png_with_chunks(&[(b"tEXt", b"old")]);
        let out = write_annotation(&png, "naïve prompt\nSteps: 4").unwrap();
        for chunk in png_chunks(&out).unwrap().map(Result::unwrap) {
            assert_eq!(chunk.crc, chunk_crc(&chunk.kind, chunk.payload));
        }
    }

    #[test]
    fn bytes_after_iend_are_dropped() {
        let mut png = png_with_chunks(&[]);
        let clean_len = png.len();
        png.extend_from_slice(b"trailing junk");
        let out = write_annotation(&png, "Steps: 2").unwrap();
        assert_eq!(out.len(), clean_len + 12 + "Steps: 2".len());
        assert!(out.ends_with(&[0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]));
    }

    #[test]
    fn missing_iend_is_an_error() {
        let mut png = png_with_chunks(&[]);
        png.truncate(png.len() - 12);
        assert_eq!(
            write_annotation(&png, "Steps: 1"),
            Err(CodecError::MissingTerminator)
        );
    }

    #[test]
    fn non_png_input_is_rejected() {
        let jpeg = jpeg_with_segments(&[]);
        assert_eq!(
            write_annotation(&jpeg, "Steps: 1"),
            Err(CodecError::BadSignature)
        );
    }
}
