//! Walkers for the two container layouts the codec understands.
//!
//! PNG (after the 8-byte signature), each chunk:
//!   Bytes 0-3:   payload length (big-endian u32, payload only)
//!   Bytes 4-7:   chunk type (ASCII, e.g. `tEXt`)
//!   Bytes 8..n:  payload
//!   Last 4:      CRC-32 over type + payload
//!
//! JPEG (after the 2-byte SOI), each segment:
//!   Bytes 0-1:   0xFF + marker byte
//!   Bytes 2-3:   segment length (big-endian u16, counts itself), absent for
//!                the standalone markers 0xD0..=0xD9
//!   Bytes 4..n:  segment payload
//!
//! Both walkers are lazy iterators over borrowed bytes. A length field that
//! runs past the end of the buffer yields one `Err` and ends the iteration.
//! CRCs are not checked on read.

use super::CodecError;

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// JPEG APP1, home of the EXIF block.
pub const APP1: u8 = 0xE1;
/// Start of scan: entropy-coded data follows, no more metadata segments.
const SOS: u8 = 0xDA;

// ---------------------------------------------------------------------------
// PNG
// ---------------------------------------------------------------------------

/// One PNG chunk, borrowed from the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub kind: [u8; 4],
    pub payload: &'a [u8],
    pub crc: u32,
    /// The chunk exactly as stored, length field through CRC.
    pub raw: &'a [u8],
}

impl Chunk<'_> {
    pub fn is(&self, kind: &[u8; 4]) -> bool {
        &self.kind == kind
    }

    /// `tEXt` or `iTXt`, the two chunk types annotations are stored in.
    pub fn is_text(&self) -> bool {
        self.is(b"tEXt") || self.is(b"iTXt")
    }

    pub fn is_end(&self) -> bool {
        self.is(b"IEND")
    }
}

/// Lazy iterator over the chunks of a PNG stream. Stops after `IEND`.
#[derive(Debug, Clone)]
pub struct PngChunks<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

/// Start walking a PNG buffer. Fails if the signature is missing.
pub fn png_chunks(data: &[u8]) -> Result<PngChunks<'_>, CodecError> {
    if !data.starts_with(&PNG_SIGNATURE) {
        return Err(CodecError::BadSignature);
    }
    Ok(PngChunks {
        data,
        pos: PNG_SIGNATURE.len(),
        done: false,
    })
}

impl<'a> PngChunks<'a> {
    fn read_chunk(&mut self) -> Result<Chunk<'a>, CodecError> {
        let start = self.pos;
        let truncated = CodecError::Truncated { offset: start };

        let header = self.data.get(start..start + 8).ok_or(truncated.clone())?;
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let end = start
            .checked_add(12)
            .and_then(|n| n.checked_add(length))
            .ok_or(truncated.clone())?;
        let raw = self.data.get(start..end).ok_or(truncated)?;

        let kind = [raw[4], raw[5], raw[6], raw[7]];
        let payload = &raw[8..8 + length];
        let crc_at = 8 + length;
        let crc = u32::from_be_bytes([
            raw[crc_at],
            raw[crc_at + 1],
            raw[crc_at + 2],
            raw[crc_at + 3],
        ]);

        self.pos = end;
        Ok(Chunk {
            kind,
            payload,
            crc,
            raw,
        })
    }
}

impl<'a> Iterator for PngChunks<'a> {
    type Item = Result<Chunk<'a>, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.data.len() {
            return None;
        }
        let chunk = self.read_chunk();
        match &chunk {
            Ok(c) => self.done = c.is_end(),
            Err(_) => self.done = true,
        }
        Some(chunk)
    }
}

// ---------------------------------------------------------------------------
// JPEG
// ---------------------------------------------------------------------------

/// One JPEG marker segment. Standalone markers have an empty payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub marker: u8,
    pub payload: &'a [u8],
}

/// Lazy iterator over JPEG marker segments, from after SOI up to SOS or EOI.
#[derive(Debug, Clone)]
pub struct JpegSegments<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

/// Start walking a JPEG buffer. Fails if it does not open with SOI.
pub fn jpeg_segments(data: &[u8]) -> Result<JpegSegments<'_>, CodecError> {
    if !data.starts_with(&JPEG_SOI) {
        return Err(CodecError::BadSignature);
    }
    Ok(JpegSegments {
        data,
        pos: JPEG_SOI.len(),
        done: false,
    })
}

impl<'a> JpegSegments<'a> {
    fn read_segment(&mut self) -> Result<Segment<'a>, CodecError> {
        // 0xFF fill bytes may pad the space before a marker
        while self.data.get(self.pos) == Some(&0xFF) && self.data.get(self.pos + 1) == Some(&0xFF)
        {
            self.pos += 1;
        }

        let start = self.pos;
        let pair = self
            .data
            .get(start..start + 2)
            .ok_or(CodecError::Truncated { offset: start })?;
        if pair[0] != 0xFF {
            return Err(CodecError::BadMarker { offset: start });
        }
        let marker = pair[1];

        // RSTn, SOI and EOI carry no length field
        if (0xD0..=0xD9).contains(&marker) {
            self.pos += 2;
            return Ok(Segment {
                marker,
                payload: &[],
            });
        }

        let len_bytes = self
            .data
            .get(start + 2..start + 4)
            .ok_or(CodecError::Truncated { offset: start })?;
        let seg_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if seg_len < 2 {
            return Err(CodecError::Truncated { offset: start });
        }
        let payload = self
            .data
            .get(start + 4..start + 2 + seg_len)
            .ok_or(CodecError::Truncated { offset: start })?;

        self.pos = start + 2 + seg_len;
        Ok(Segment { marker, payload })
    }
}

impl<'a> Iterator for JpegSegments<'a> {
    type Item = Result<Segment<'a>, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.data.len() {
            return None;
        }
        let segment = self.read_segment();
        match &segment {
            Ok(s) => self.done = s.marker == SOS || s.marker == 0xD9,
            Err(_) => self.done = true,
        }
        Some(segment)
    }
}
