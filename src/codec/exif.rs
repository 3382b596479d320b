//! Annotation lookup in JPEG files via EXIF `UserComment`.
//!
//! Path to the text:
//!   JPEG APP1 segment starting with `Exif\0\0`
//!     → TIFF header (`II`/`MM`, magic 42, offset of IFD0)
//!     → IFD chain, descending into the Exif sub-IFD (tag 34665)
//!     → UserComment entry (tag 37510)
//!
//! IFD entry layout (12 bytes, in the TIFF's byte order):
//!   Bytes 0-1:   tag
//!   Bytes 2-3:   field type
//!   Bytes 4-7:   value count
//!   Bytes 8-11:  value itself if it fits in 4 bytes, else an offset into
//!                the TIFF buffer
//!
//! UserComment opens with an 8-byte character code. `UNICODE\0` means
//! UTF-16, always big-endian whatever the TIFF byte order says.
//!
//! When no comment turns up, the whole file is scanned as text for a
//! `Steps:` run, which catches tools that dump parameters into other
//! segments.

use super::CodecError;
use super::chunks::{APP1, jpeg_segments};

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const TIFF_MAGIC: u16 = 42;

const TAG_EXIF_IFD: u16 = 34665;
const TAG_USER_COMMENT: u16 = 37510;

const UNICODE_PREFIX: &[u8] = b"UNICODE\0";
const ASCII_PREFIX: &[u8] = b"ASCII\0\0\0";
const UNDEFINED_PREFIX: &[u8] = &[0; 8];

/// Find the annotation in a JPEG: EXIF UserComment first, raw scan second.
///
/// A malformed EXIF block only surfaces as an error when the raw scan
/// comes up empty too.
pub fn extract(data: &[u8]) -> Result<Option<String>, CodecError> {
    let walked = find_user_comment_in_jpeg(data);
    if let Ok(Some(bytes)) = &walked {
        let text = decode_user_comment(bytes);
        if !text.is_empty() {
            return Ok(Some(text));
        }
    }
    if let Some(text) = scan_for_parameters(data) {
        return Ok(Some(text));
    }
    walked.map(|_| None)
}

/// Best-effort variant of [`extract`]: malformed input is simply `None`.
pub fn find_annotation(data: &[u8]) -> Option<String> {
    extract(data).ok().flatten()
}

/// Raw UserComment bytes from the first EXIF APP1 segment that has one.
fn find_user_comment_in_jpeg(data: &[u8]) -> Result<Option<&[u8]>, CodecError> {
    for segment in jpeg_segments(data)? {
        let segment = segment?;
        if segment.marker != APP1 {
            continue;
        }
        let Some(tiff) = segment.payload.strip_prefix(EXIF_HEADER) else {
            continue;
        };
        if let Some(comment) = find_user_comment(tiff)? {
            return Ok(Some(comment));
        }
    }
    Ok(None)
}

/// Last resort: everything from the first `Steps:` to the end of the file.
fn scan_for_parameters(data: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(data);
    text.find("Steps:").map(|at| text[at..].to_string())
}

/// Decode a UserComment value, honoring its 8-byte character code.
pub fn decode_user_comment(bytes: &[u8]) -> String {
    let text = if let Some(rest) = bytes.strip_prefix(UNICODE_PREFIX) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        let rest = bytes
            .strip_prefix(ASCII_PREFIX)
            .or_else(|| bytes.strip_prefix(UNDEFINED_PREFIX))
            .unwrap_or(bytes);
        String::from_utf8_lossy(rest).into_owned()
    };
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

// ---------------------------------------------------------------------------
// TIFF directory traversal
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteOrder {
    Little,
    Big,
}

/// One 12-byte IFD entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IfdEntry {
    tag: u16,
    kind: u16,
    count: u32,
    value_or_offset: u32,
    /// Where the 4-byte value field sits, for values stored inline.
    value_pos: usize,
}

impl IfdEntry {
    /// Encoded size of the value: count is in units of the field type.
    fn byte_len(&self) -> usize {
        let unit = match self.kind {
            1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
            3 | 8 => 2,         // SHORT, SSHORT
            4 | 9 | 11 => 4,    // LONG, SLONG, FLOAT
            5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
            _ => 1,
        };
        (self.count as usize).saturating_mul(unit)
    }
}

/// A TIFF buffer plus the byte order fixed by its header.
///
/// Carries no cursor: every read takes an explicit offset, so sub-IFD
/// recursion needs nothing beyond the call stack.
#[derive(Debug, Clone, Copy)]
struct Tiff<'a> {
    data: &'a [u8],
    order: ByteOrder,
}

impl<'a> Tiff<'a> {
    fn parse(data: &'a [u8]) -> Result<Self, CodecError> {
        let order = match data.get(0..2) {
            Some(b"II") => ByteOrder::Little,
            Some(b"MM") => ByteOrder::Big,
            Some(_) => return Err(CodecError::BadByteOrder),
            None => return Err(CodecError::Truncated { offset: 0 }),
        };
        let tiff = Tiff { data, order };
        let magic = tiff.u16_at(2)?;
        if magic != TIFF_MAGIC {
            return Err(CodecError::BadMagic(magic));
        }
        Ok(tiff)
    }

    fn bytes(&self, offset: usize, len: usize) -> Result<&'a [u8], CodecError> {
        offset
            .checked_add(len)
            .and_then(|end| self.data.get(offset..end))
            .ok_or(CodecError::Truncated { offset })
    }

    fn u16_at(&self, offset: usize) -> Result<u16, CodecError> {
        let b = self.bytes(offset, 2)?;
        let b = [b[0], b[1]];
        Ok(match self.order {
            ByteOrder::Little => u16::from_le_bytes(b),
            ByteOrder::Big => u16::from_be_bytes(b),
        })
    }

    fn u32_at(&self, offset: usize) -> Result<u32, CodecError> {
        let b = self.bytes(offset, 4)?;
        let b = [b[0], b[1], b[2], b[3]];
        Ok(match self.order {
            ByteOrder::Little => u32::from_le_bytes(b),
            ByteOrder::Big => u32::from_be_bytes(b),
        })
    }

    fn entry(&self, offset: usize) -> Result<IfdEntry, CodecError> {
        Ok(IfdEntry {
            tag: self.u16_at(offset)?,
            kind: self.u16_at(offset + 2)?,
            count: self.u32_at(offset + 4)?,
            value_or_offset: self.u32_at(offset + 8)?,
            value_pos: offset + 8,
        })
    }

    fn value(&self, entry: &IfdEntry) -> Result<&'a [u8], CodecError> {
        let len = entry.byte_len();
        if len <= 4 {
            self.bytes(entry.value_pos, len)
        } else {
            self.bytes(entry.value_or_offset as usize, len)
        }
    }

    /// Walk an IFD and everything chained after it, depth-first into
    /// Exif sub-IFDs. The first UserComment seen ends the walk.
    fn walk_chain(
        &self,
        mut offset: usize,
        visited: &mut Vec<usize>,
    ) -> Result<Option<&'a [u8]>, CodecError> {
        while offset != 0 {
            if visited.contains(&offset) {
                return Err(CodecError::LoopingIfd(offset));
            }
            visited.push(offset);

            let count = self.u16_at(offset)? as usize;
            let entries_start = offset + 2;
            for i in 0..count {
                let entry = self.entry(entries_start + i * 12)?;
                match entry.tag {
                    TAG_USER_COMMENT => return self.value(&entry).map(Some),
                    TAG_EXIF_IFD => {
                        let sub = entry.value_or_offset as usize;
                        if let Some(found) = self.walk_chain(sub, visited)? {
                            return Ok(Some(found));
                        }
                    }
                    _ => {}
                }
            }

            offset = self.u32_at(entries_start + count * 12)? as usize;
        }
        Ok(None)
    }
}

/// Raw UserComment bytes from a TIFF buffer (the part after `Exif\0\0`).
///
/// `Ok(None)` when the chain ends (next-IFD link of 0) without one.
pub fn find_user_comment(tiff: &[u8]) -> Result<Option<&[u8]>, CodecError> {
    let tiff = Tiff::parse(tiff)?;
    let first = tiff.u32_at(4)? as usize;
    tiff.walk_chain(first, &mut Vec::new())
}
