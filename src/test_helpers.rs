//! Shared test utilities: in-memory PNG, JPEG and TIFF fixtures.
//!
//! Fixtures are built byte by byte so every test states exactly what the
//! container holds, with no binary files checked in.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let png = png_with_chunks(&[(b"tEXt", b"a cat\nSteps: 20")]);
//! let tiff = tiff_with_user_comment(false, &unicode_comment("café"), true);
//! let jpeg = jpeg_with_exif(&tiff);
//! ```

use crate::codec::chunks::{JPEG_SOI, PNG_SIGNATURE, png_chunks};
use crate::codec::png_writer::encode_chunk;

// =========================================================================
// PNG
// =========================================================================

/// 1x1 grayscale IHDR payload.
const IHDR: [u8; 13] = [0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0];
/// Deflated single scanline for the 1x1 image.
const IDAT: [u8; 10] = [0x78, 0x9C, 0x63, 0x60, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01];

/// Build a minimal PNG: signature, IHDR, `extra` chunks, IDAT, IEND.
pub fn png_with_chunks(extra: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    let mut out = PNG_SIGNATURE.to_vec();
    encode_chunk(b"IHDR", &IHDR, &mut out).unwrap();
    for (kind, payload) in extra {
        encode_chunk(kind, payload, &mut out).unwrap();
    }
    encode_chunk(b"IDAT", &IDAT, &mut out).unwrap();
    encode_chunk(b"IEND", &[], &mut out).unwrap();
    out
}

/// Chunk types of a well-formed PNG, in stream order.
pub fn chunk_kinds(png: &[u8]) -> Vec<[u8; 4]> {
    png_chunks(png)
        .unwrap()
        .map(|c| c.unwrap().kind)
        .collect()
}

// =========================================================================
// TIFF / EXIF
// =========================================================================

/// Value field of an IFD entry.
pub enum TiffValue {
    /// A number written in the TIFF's byte order (offsets, LONGs).
    Number(u32),
    /// Raw bytes stored inline, left-aligned.
    Inline([u8; 4]),
}

pub struct TiffEntry {
    pub tag: u16,
    pub kind: u16,
    pub count: u32,
    pub value: TiffValue,
}

impl TiffEntry {
    pub fn offset(tag: u16, kind: u16, count: u32, value: u32) -> Self {
        Self {
            tag,
            kind,
            count,
            value: TiffValue::Number(value),
        }
    }
}

/// Build a TIFF buffer: header, then each IFD back to back from offset 8,
/// then `tail`. Each IFD takes `2 + 12 * entries + 4` bytes, so callers can
/// compute where later IFDs and the tail land.
pub fn build_tiff(big_endian: bool, ifds: &[(Vec<TiffEntry>, u32)], tail: &[u8]) -> Vec<u8> {
    let w16 = |v: u16| {
        if big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };
    let w32 = |v: u32| {
        if big_endian {
            v.to_be_bytes()
        } else {
            v.to_le_bytes()
        }
    };

    let mut out = Vec::new();
    out.extend_from_slice(if big_endian { b"MM" } else { b"II" });
    out.extend_from_slice(&w16(42));
    out.extend_from_slice(&w32(8));

    for (entries, next) in ifds {
        out.extend_from_slice(&w16(entries.len() as u16));
        for entry in entries {
            out.extend_from_slice(&w16(entry.tag));
            out.extend_from_slice(&w16(entry.kind));
            out.extend_from_slice(&w32(entry.count));
            match entry.value {
                TiffValue::Number(v) => out.extend_from_slice(&w32(v)),
                TiffValue::Inline(bytes) => out.extend_from_slice(&bytes),
            }
        }
        out.extend_from_slice(&w32(*next));
    }
    out.extend_from_slice(tail);
    out
}

/// TIFF with a single UserComment, in IFD0 or behind an Exif sub-IFD pointer.
pub fn tiff_with_user_comment(big_endian: bool, comment: &[u8], in_exif_ifd: bool) -> Vec<u8> {
    const IFD_SIZE: u32 = 2 + 12 + 4;
    let comment_entry = |data_offset: u32| {
        if comment.len() <= 4 {
            let mut inline = [0u8; 4];
            inline[..comment.len()].copy_from_slice(comment);
            TiffEntry {
                tag: 37510,
                kind: 7,
                count: comment.len() as u32,
                value: TiffValue::Inline(inline),
            }
        } else {
            TiffEntry::offset(37510, 7, comment.len() as u32, data_offset)
        }
    };
    let tail: &[u8] = if comment.len() > 4 { comment } else { &[] };

    if in_exif_ifd {
        let sub_ifd = 8 + IFD_SIZE;
        build_tiff(
            big_endian,
            &[
                (vec![TiffEntry::offset(34665, 4, 1, sub_ifd)], 0),
                (vec![comment_entry(sub_ifd + IFD_SIZE)], 0),
            ],
            tail,
        )
    } else {
        build_tiff(big_endian, &[(vec![comment_entry(8 + IFD_SIZE)], 0)], tail)
    }
}

/// UserComment bytes with the `UNICODE\0` code and big-endian UTF-16 text.
pub fn unicode_comment(text: &str) -> Vec<u8> {
    let mut out = b"UNICODE\0".to_vec();
    for unit in text.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    out
}

// =========================================================================
// JPEG
// =========================================================================

/// SOI, the given `(marker, payload)` segments, a tiny scan, EOI.
pub fn jpeg_with_segments(segments: &[(u8, &[u8])]) -> Vec<u8> {
    let mut out = JPEG_SOI.to_vec();
    for (marker, payload) in segments {
        out.extend_from_slice(&[0xFF, *marker]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
    }
    // SOS header for one component, then a few bytes of scan data
    out.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
    out.extend_from_slice(&[0x12, 0x34, 0x56]);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

/// APP1 payload: `Exif\0\0` followed by the TIFF buffer.
pub fn exif_app1(tiff: &[u8]) -> Vec<u8> {
    let mut out = b"Exif\0\0".to_vec();
    out.extend_from_slice(tiff);
    out
}

/// JPEG with a JFIF APP0 and an EXIF APP1 around `tiff`.
pub fn jpeg_with_exif(tiff: &[u8]) -> Vec<u8> {
    let jfif: &[u8] = b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0";
    jpeg_with_segments(&[(0xE0, jfif), (0xE1, &exif_app1(tiff))])
}
