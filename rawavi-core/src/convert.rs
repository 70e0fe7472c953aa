// FRAME DECODER - Raw AVI frame to canonical top-down buffer
//
// Source rows are tightly packed (width * bytes per pixel) and either
// top-down or bottom-up. Output rows are always top-down and start at
// `row * pitch`; bytes between the end of a row and the next pitch
// boundary are left untouched.

use serde::{Deserialize, Serialize};

use crate::error::{AviError, Result};
use crate::headers::{Orientation, Palette};
use crate::pixel::{PixelFormat, PixelLayout};

// ============================================================================
// Frame Layout
// ============================================================================

/// Everything needed to interpret one raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameLayout {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
}

impl FrameLayout {
    pub fn source_row_bytes(&self) -> usize {
        (self.width as usize).saturating_mul(self.format.bytes_per_pixel())
    }

    pub fn source_frame_size(&self) -> usize {
        self.format
            .frame_size(self.width as usize, self.height as usize)
    }

    pub fn output_layout(&self) -> PixelLayout {
        self.format.output_layout()
    }

    /// Smallest pitch that holds one output row.
    pub fn min_pitch(&self) -> usize {
        self.output_layout().row_bytes(self.width as usize)
    }

    /// Destination bytes needed at `pitch`; the last row needs no slack.
    pub fn output_size(&self, pitch: usize) -> usize {
        match self.height as usize {
            0 => 0,
            h => pitch
                .saturating_mul(h - 1)
                .saturating_add(self.min_pitch()),
        }
    }
}

/// A canonical decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Byte distance between the starts of consecutive rows
    pub pitch: usize,
    pub layout: PixelLayout,
}

impl DecodedFrame {
    /// Pixel bytes of row `y`, without pitch padding. `None` past the last row.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height as usize {
            return None;
        }
        let start = y.checked_mul(self.pitch)?;
        let end = start.checked_add(self.layout.row_bytes(self.width as usize))?;
        self.data.get(start..end)
    }
}

// ============================================================================
// Row Converters
// ============================================================================

type RowConverter = fn(&[u8], &mut [u8], &Palette);

impl PixelFormat {
    fn row_converter(&self) -> RowConverter {
        match self {
            PixelFormat::Indexed8 => indexed8_to_rgb24,
            PixelFormat::Rgb565 => rgb565_copy,
            PixelFormat::Bgr24 => bgr24_to_rgb24,
            PixelFormat::Bgra32 => bgra32_to_rgba32,
        }
    }
}

fn indexed8_to_rgb24(src: &[u8], dst: &mut [u8], palette: &Palette) {
    for (&index, out) in src.iter().zip(dst.chunks_exact_mut(3)) {
        out.copy_from_slice(&palette.lookup(index));
    }
}

// Already little-endian RGB565, same as the output.
fn rgb565_copy(src: &[u8], dst: &mut [u8], _palette: &Palette) {
    dst.copy_from_slice(src);
}

fn bgr24_to_rgb24(src: &[u8], dst: &mut [u8], _palette: &Palette) {
    for (px, out) in src.chunks_exact(3).zip(dst.chunks_exact_mut(3)) {
        out[0] = px[2];
        out[1] = px[1];
        out[2] = px[0];
    }
}

fn bgra32_to_rgba32(src: &[u8], dst: &mut [u8], _palette: &Palette) {
    for (px, out) in src.chunks_exact(4).zip(dst.chunks_exact_mut(4)) {
        out[0] = px[2];
        out[1] = px[1];
        out[2] = px[0];
        out[3] = px[3];
    }
}

// ============================================================================
// Decode
// ============================================================================

/// Converts `raw` into `dst`, writing row `y` at `y * pitch`.
///
/// Indexed frames without a palette decode to black. Bytes in `raw` past
/// the frame's tight size are ignored.
pub fn decode_into(
    raw: &[u8],
    layout: &FrameLayout,
    palette: Option<&Palette>,
    dst: &mut [u8],
    pitch: usize,
) -> Result<()> {
    check_source(raw, layout, pitch)?;

    let min_pitch = layout.min_pitch();
    let needed = layout.output_size(pitch);
    if dst.len() < needed {
        return Err(AviError::DestinationTooSmall {
            needed,
            actual: dst.len(),
        });
    }

    let empty = Palette::default();
    let palette = palette.unwrap_or(&empty);
    let convert = layout.format.row_converter();
    let src_row = layout.source_row_bytes();
    let height = layout.height as usize;

    for y in 0..height {
        let sy = layout.orientation.source_row(y, height);
        let src = &raw[sy * src_row..(sy + 1) * src_row];
        let out = &mut dst[y * pitch..y * pitch + min_pitch];
        convert(src, out, palette);
    }

    Ok(())
}

fn check_source(raw: &[u8], layout: &FrameLayout, pitch: usize) -> Result<()> {
    let min_pitch = layout.min_pitch();
    if pitch < min_pitch {
        return Err(AviError::InvalidPitch {
            pitch,
            min: min_pitch,
        });
    }

    let expected = layout.source_frame_size();
    if raw.len() < expected {
        return Err(AviError::TruncatedFrame {
            expected,
            actual: raw.len(),
        });
    }
    Ok(())
}

/// Allocates a zeroed `pitch * height` buffer and decodes into it.
pub fn decode(
    raw: &[u8],
    layout: &FrameLayout,
    palette: Option<&Palette>,
    pitch: usize,
) -> Result<DecodedFrame> {
    // Reject before allocating: dimensions come from the file.
    check_source(raw, layout, pitch)?;
    let mut data = vec![0u8; pitch.saturating_mul(layout.height as usize)];
    decode_into(raw, layout, palette, &mut data, pitch)?;
    Ok(DecodedFrame {
        data,
        width: layout.width,
        height: layout.height,
        pitch,
        layout: layout.output_layout(),
    })
}
