// PIXEL FORMATS - Raw AVI bit depths and their canonical output layouts
//
// Only uncompressed (BI_RGB) bitmaps are accepted. Each supported depth
// maps to exactly one source encoding and one output layout.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AviError, Result};
use crate::headers::{BitmapFormat, BI_RGB};

// ============================================================================
// Pixel Formats
// ============================================================================

/// Source encoding of a frame, resolved once per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelFormat {
    Indexed8, // palette index per pixel
    Rgb565,   // 16-bit little-endian
    Bgr24,    // Windows byte order
    Bgra32,   // Windows byte order with alpha
}

impl PixelFormat {
    /// Bytes per source pixel
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Indexed8 => 1,
            Self::Rgb565 => 2,
            Self::Bgr24 => 3,
            Self::Bgra32 => 4,
        }
    }

    /// Layout of the decoded buffer
    pub fn output_layout(&self) -> PixelLayout {
        match self {
            Self::Indexed8 | Self::Bgr24 => PixelLayout::Rgb24,
            Self::Rgb565 => PixelLayout::Rgb565,
            Self::Bgra32 => PixelLayout::Rgba32,
        }
    }

    /// Bytes one tightly packed source frame occupies
    pub fn frame_size(&self, width: usize, height: usize) -> usize {
        width
            .saturating_mul(height)
            .saturating_mul(self.bytes_per_pixel())
    }
}

/// Pixel layout of a canonical (top-down) buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixelLayout {
    Rgb24,
    Rgb565,
    Rgba32,
}

impl PixelLayout {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb565 => 2,
            Self::Rgb24 => 3,
            Self::Rgba32 => 4,
        }
    }

    pub fn row_bytes(&self, width: usize) -> usize {
        width.saturating_mul(self.bytes_per_pixel())
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba32)
    }
}

/// Classifies a bitmap format record, rejecting compressed data outright.
pub fn resolve(format: &BitmapFormat) -> Result<PixelFormat> {
    if format.compression != BI_RGB {
        return Err(AviError::CompressedNotSupported {
            code: format.compression,
        });
    }
    match format.bit_count {
        8 => Ok(PixelFormat::Indexed8),
        16 => Ok(PixelFormat::Rgb565),
        24 => Ok(PixelFormat::Bgr24),
        32 => Ok(PixelFormat::Bgra32),
        depth => Err(AviError::UnsupportedBitDepth { depth }),
    }
}

// ============================================================================
// Cadence
// ============================================================================

pub const FALLBACK_FPS: u32 = 30;

/// Presentation rate derived from the main header's frame duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    fps: f64,
    interval: Duration,
    fallback: bool,
}

impl Cadence {
    /// A zero frame duration falls back to 30 frames per second.
    pub fn from_micros_per_frame(micros: u32) -> Self {
        if micros == 0 {
            Self {
                fps: f64::from(FALLBACK_FPS),
                interval: Duration::from_secs(1) / FALLBACK_FPS,
                fallback: true,
            }
        } else {
            Self {
                fps: 1_000_000.0 / f64::from(micros),
                interval: Duration::from_micros(u64::from(micros)),
                fallback: false,
            }
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn duration_secs(&self, frames: u32) -> f64 {
        f64::from(frames) / self.fps
    }
}
