// CHUNK READER - Bounded RIFF chunk cursor
//
// Every chunk is a FourCC plus a u32 little-endian payload length.
// Lengths come straight from the file, so each header is checked
// against the end of its enclosing region before anything is skipped
// or read. Payloads are padded to even offsets.

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use bytes::Buf;

use crate::error::{AviError, Result};

// ============================================================================
// FourCC Constants
// ============================================================================

pub type FourCc = [u8; 4];

pub const RIFF: FourCc = *b"RIFF";
pub const AVI_: FourCc = *b"AVI ";
pub const LIST: FourCc = *b"LIST";
pub const HDRL: FourCc = *b"hdrl"; // header list
pub const AVIH: FourCc = *b"avih"; // main AVI header
pub const STRL: FourCc = *b"strl"; // stream list
pub const STRH: FourCc = *b"strh"; // stream header
pub const STRF: FourCc = *b"strf"; // stream format
pub const MOVI: FourCc = *b"movi"; // movie data

// Stream types
pub const VIDS: FourCc = *b"vids";
pub const AUDS: FourCc = *b"auds";
pub const TXTS: FourCc = *b"txts";

// Stream 0 video payloads
pub const VIDEO_UNCOMPRESSED: FourCc = *b"00dc";
pub const VIDEO_DIB: FourCc = *b"00db";

pub const CHUNK_HEADER_SIZE: u64 = 8;

pub fn fourcc_to_string(fourcc: &FourCc) -> String {
    fourcc
        .iter()
        .filter(|&&b| b.is_ascii_graphic() || b == b' ')
        .map(|&b| b as char)
        .collect()
}

// ============================================================================
// Chunk Tag
// ============================================================================

/// A chunk header whose payload is known to fit inside its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkTag {
    pub id: FourCc,
    pub size: u32,
    /// Absolute offset of the first payload byte.
    pub offset: u64,
}

impl ChunkTag {
    pub fn end(&self) -> u64 {
        self.offset + u64::from(self.size)
    }

    pub fn is(&self, id: &FourCc) -> bool {
        &self.id == id
    }
}

// ============================================================================
// Chunk Reader
// ============================================================================

pub struct ChunkReader<'a, R: Read + Seek> {
    reader: &'a mut R,
    position: u64,
    len: u64,
}

impl<'a, R: Read + Seek> ChunkReader<'a, R> {
    /// Wraps a byte source, rewinding it to the start.
    pub fn new(reader: &'a mut R) -> Result<Self> {
        let len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self {
            reader,
            position: 0,
            len,
        })
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reads the next chunk header of a region ending at `end`.
    ///
    /// Returns `None` once the cursor has reached `end`. A header that
    /// straddles `end`, or a payload that would cross it, is a
    /// `TruncatedChunkTree`.
    pub fn read_header(&mut self, end: u64) -> Result<Option<ChunkTag>> {
        if self.position >= end {
            return Ok(None);
        }
        let start = self.position;
        if end - start < CHUNK_HEADER_SIZE {
            return Err(AviError::truncated(
                start,
                format!("{} bytes left in region, chunk header needs 8", end - start),
            ));
        }

        let raw = self.read_exact(CHUNK_HEADER_SIZE as usize)?;
        let mut buf = &raw[..];
        let mut id = [0u8; 4];
        buf.copy_to_slice(&mut id);
        let size = buf.get_u32_le();

        let tag = ChunkTag {
            id,
            size,
            offset: self.position,
        };
        if tag.end() > end {
            return Err(AviError::truncated(
                start,
                format!(
                    "chunk '{}' declares {} bytes, region ends {} bytes after its payload start",
                    fourcc_to_string(&id),
                    size,
                    end - tag.offset
                ),
            ));
        }
        Ok(Some(tag))
    }

    /// Reads a LIST sub-type, returning it with the end of the list's body.
    pub fn read_list_type(&mut self, tag: &ChunkTag) -> Result<(FourCc, u64)> {
        if tag.size < 4 {
            return Err(AviError::truncated(tag.offset, "LIST shorter than its type field"));
        }
        let raw = self.read_exact(4)?;
        let mut list_type = [0u8; 4];
        list_type.copy_from_slice(&raw);
        Ok((list_type, tag.end()))
    }

    /// Reads `n` bytes; a short read is a `TruncatedChunkTree`.
    pub fn read_exact(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => {
                self.position += n as u64;
                Ok(buf)
            }
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Err(AviError::truncated(
                self.position,
                format!("short read of {} bytes", n),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads the whole payload of `tag`. The cursor must sit at its start.
    pub fn read_payload(&mut self, tag: &ChunkTag) -> Result<Vec<u8>> {
        self.read_exact(tag.size as usize)
    }

    pub fn skip(&mut self, n: u64) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let target = self.position + n;
        if target > self.len {
            return Err(AviError::truncated(
                self.position,
                format!("skip of {} bytes runs past end of file", n),
            ));
        }
        let offset = i64::try_from(n)
            .map_err(|_| AviError::truncated(self.position, "skip distance overflows"))?;
        self.reader.seek(SeekFrom::Current(offset))?;
        self.position = target;
        Ok(())
    }

    /// Moves to the end of `tag`'s payload, then over the pad byte of an
    /// odd-sized chunk when one fits before `region_end`.
    pub fn finish(&mut self, tag: &ChunkTag, region_end: u64) -> Result<()> {
        let payload_end = tag.end();
        if self.position > payload_end {
            return Err(AviError::truncated(
                tag.offset,
                format!("record overran chunk '{}'", fourcc_to_string(&tag.id)),
            ));
        }
        self.skip(payload_end - self.position)?;
        if tag.size % 2 == 1 && payload_end < region_end {
            self.skip(1)?;
        }
        Ok(())
    }
}
