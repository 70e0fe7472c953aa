//! Fixed-layout AVI records, decoded field by field from little-endian bytes.
//!
//! Each `parse` checks the slice length before the first field is read, so a
//! short record is reported as `TruncatedChunkTree` instead of panicking.

use bytes::Buf;
use serde::{Deserialize, Serialize};

use crate::chunk::{fourcc_to_string, FourCc, AUDS, AVI_, RIFF, TXTS, VIDS};
use crate::error::{AviError, Result};

fn ensure_len(data: &[u8], need: usize, offset: u64, what: &str) -> Result<()> {
    if data.len() < need {
        return Err(AviError::truncated(
            offset,
            format!("{} needs {} bytes, chunk holds {}", what, need, data.len()),
        ));
    }
    Ok(())
}

fn get_fourcc(buf: &mut &[u8]) -> FourCc {
    let mut fourcc = [0u8; 4];
    buf.copy_to_slice(&mut fourcc);
    fourcc
}

// ============================================================================
// RIFF Header
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiffHeader {
    pub signature: FourCc,
    /// Size of everything after this field.
    pub size: u32,
    pub form: FourCc,
}

impl RiffHeader {
    pub const SIZE: usize = 12;

    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < Self::SIZE {
            return Err(AviError::InvalidContainer);
        }
        let mut buf = data;
        let header = Self {
            signature: get_fourcc(&mut buf),
            size: buf.get_u32_le(),
            form: get_fourcc(&mut buf),
        };
        if header.signature != RIFF || header.form != AVI_ {
            return Err(AviError::InvalidContainer);
        }
        Ok(header)
    }

    /// Absolute end of the RIFF body as declared.
    pub fn declared_end(&self) -> u64 {
        8 + u64::from(self.size)
    }
}

// ============================================================================
// Main Header (avih)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainHeader {
    pub microsec_per_frame: u32,
    pub max_bytes_per_sec: u32,
    pub padding_granularity: u32,
    pub flags: u32,
    pub total_frames: u32,
    pub initial_frames: u32,
    pub streams: u32,
    pub suggested_buffer_size: u32,
    pub width: u32,
    pub height: u32,
}

impl MainHeader {
    /// Bytes read; the four reserved words that usually follow are skipped.
    pub const SIZE: usize = 40;

    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        ensure_len(data, Self::SIZE, offset, "avih")?;
        let mut buf = data;
        Ok(Self {
            microsec_per_frame: buf.get_u32_le(),
            max_bytes_per_sec: buf.get_u32_le(),
            padding_granularity: buf.get_u32_le(),
            flags: buf.get_u32_le(),
            total_frames: buf.get_u32_le(),
            initial_frames: buf.get_u32_le(),
            streams: buf.get_u32_le(),
            suggested_buffer_size: buf.get_u32_le(),
            width: buf.get_u32_le(),
            height: buf.get_u32_le(),
        })
    }
}

// ============================================================================
// Stream Header (strh)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    Unknown,
}

impl StreamKind {
    pub fn from_fourcc(fourcc: &FourCc) -> Self {
        match *fourcc {
            VIDS => StreamKind::Video,
            AUDS => StreamKind::Audio,
            TXTS => StreamKind::Subtitle,
            _ => StreamKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRect {
    pub left: i16,
    pub top: i16,
    pub right: i16,
    pub bottom: i16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    pub fcc_type: FourCc,
    pub fcc_handler: FourCc,
    pub flags: u32,
    pub priority: u16,
    pub language: u16,
    pub initial_frames: u32,
    pub scale: u32,
    pub rate: u32,
    pub start: u32,
    pub length: u32,
    pub suggested_buffer_size: u32,
    pub quality: u32,
    pub sample_size: u32,
    /// Present only in headers long enough to carry it.
    pub frame: Option<FrameRect>,
}

impl StreamHeader {
    pub const SIZE: usize = 48;
    const SIZE_WITH_FRAME: usize = 56;

    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        ensure_len(data, Self::SIZE, offset, "strh")?;
        let mut buf = data;
        let mut header = Self {
            fcc_type: get_fourcc(&mut buf),
            fcc_handler: get_fourcc(&mut buf),
            flags: buf.get_u32_le(),
            priority: buf.get_u16_le(),
            language: buf.get_u16_le(),
            initial_frames: buf.get_u32_le(),
            scale: buf.get_u32_le(),
            rate: buf.get_u32_le(),
            start: buf.get_u32_le(),
            length: buf.get_u32_le(),
            suggested_buffer_size: buf.get_u32_le(),
            quality: buf.get_u32_le(),
            sample_size: buf.get_u32_le(),
            frame: None,
        };
        if data.len() >= Self::SIZE_WITH_FRAME {
            header.frame = Some(FrameRect {
                left: buf.get_i16_le(),
                top: buf.get_i16_le(),
                right: buf.get_i16_le(),
                bottom: buf.get_i16_le(),
            });
        }
        Ok(header)
    }

    pub fn kind(&self) -> StreamKind {
        StreamKind::from_fourcc(&self.fcc_type)
    }

    pub fn handler(&self) -> String {
        fourcc_to_string(&self.fcc_handler)
    }
}

// ============================================================================
// Bitmap Format (strf, BITMAPINFOHEADER)
// ============================================================================

/// Compression code of raw RGB bitmaps.
pub const BI_RGB: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapFormat {
    pub header_size: u32,
    pub width: i32,
    /// Negative when rows are stored top-down.
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

impl BitmapFormat {
    pub const SIZE: usize = 40;

    pub fn parse(data: &[u8], offset: u64) -> Result<Self> {
        ensure_len(data, Self::SIZE, offset, "BITMAPINFOHEADER")?;
        let mut buf = data;
        Ok(Self {
            header_size: buf.get_u32_le(),
            width: buf.get_i32_le(),
            height: buf.get_i32_le(),
            planes: buf.get_u16_le(),
            bit_count: buf.get_u16_le(),
            compression: buf.get_u32_le(),
            size_image: buf.get_u32_le(),
            x_pels_per_meter: buf.get_i32_le(),
            y_pels_per_meter: buf.get_i32_le(),
            clr_used: buf.get_u32_le(),
            clr_important: buf.get_u32_le(),
        })
    }

    pub fn orientation(&self) -> Orientation {
        if self.height < 0 {
            Orientation::TopDown
        } else {
            Orientation::BottomUp
        }
    }

    pub fn abs_height(&self) -> u32 {
        self.height.unsigned_abs()
    }
}

/// Scan-line order of stored frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    TopDown,
    BottomUp,
}

impl Orientation {
    /// Source row feeding destination row `y` of a `height`-row image.
    pub fn source_row(self, y: usize, height: usize) -> usize {
        match self {
            Orientation::TopDown => y,
            Orientation::BottomUp => height - 1 - y,
        }
    }
}

// ============================================================================
// Palette
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaletteEntry {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub reserved: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl Palette {
    pub const ENTRY_SIZE: usize = 4;
    /// Substituted for indices past the end of the palette.
    pub const FALLBACK: [u8; 3] = [0, 0, 0];

    /// Decodes RGBQUAD records; a trailing partial record is dropped.
    pub fn parse(data: &[u8]) -> Self {
        let entries = data
            .chunks_exact(Self::ENTRY_SIZE)
            .map(|quad| PaletteEntry {
                blue: quad[0],
                green: quad[1],
                red: quad[2],
                reserved: quad[3],
            })
            .collect();
        Self { entries }
    }

    pub fn from_entries(entries: Vec<PaletteEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn lookup(&self, index: u8) -> [u8; 3] {
        match self.entries.get(index as usize) {
            Some(entry) => [entry.red, entry.green, entry.blue],
            None => Self::FALLBACK,
        }
    }
}
