//! # rawavi Core
//!
//! Uncompressed AVI playback engine: RIFF/AVI chunk parsing, frame
//! indexing and conversion of raw frames (8-bit indexed, RGB565, BGR24,
//! BGRA32) into top-down RGB/RGBA buffers.

// ============================================================================
// Container
// ============================================================================
pub mod chunk;
pub mod headers;
pub mod demuxer;

// ============================================================================
// Pixels
// ============================================================================
pub mod pixel;
pub mod convert;

// ============================================================================
// Playback
// ============================================================================
pub mod clock;
pub mod config;
pub mod player;

pub mod error;

pub use clock::PlaybackClock;
pub use config::{FrameErrorPolicy, PlaybackConfig};
pub use convert::{decode, decode_into, DecodedFrame, FrameLayout};
pub use demuxer::{parse, probe, AviInfo, AviMovie, AviSource, FrameIndex, FrameIndexEntry};
pub use error::{AviError, Result};
pub use headers::{BitmapFormat, MainHeader, Orientation, Palette, PaletteEntry, StreamHeader};
pub use pixel::{resolve, Cadence, PixelFormat, PixelLayout};
pub use player::{FrameSink, PlaybackStats, Player, StopHandle};

// ============================================================================
// Version
// ============================================================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
