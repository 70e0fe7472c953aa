//! Error taxonomy for container parsing and frame decoding.

use thiserror::Error;

use crate::chunk::{fourcc_to_string, FourCc};

#[derive(Debug, Error)]
pub enum AviError {
    #[error("Not a RIFF/AVI container")]
    InvalidContainer,
    #[error("Truncated chunk tree at offset {offset}: {detail}")]
    TruncatedChunkTree { offset: u64, detail: String },
    #[error("Header list (LIST hdrl) missing")]
    HeaderListMissing,
    #[error("Required chunk '{}' missing", fourcc_to_string(.0))]
    MissingChunk(FourCc),
    #[error("No video stream format found")]
    NoVideoStream,
    #[error("No video frames indexed")]
    NoFramesIndexed,
    #[error("Compressed formats not supported (compression = {code:#x})")]
    CompressedNotSupported { code: u32 },
    #[error("Unsupported bit depth: {depth}")]
    UnsupportedBitDepth { depth: u16 },
    #[error("Truncated frame: need {expected} bytes, have {actual}")]
    TruncatedFrame { expected: usize, actual: usize },
    #[error("Frame {index} out of range ({count} indexed)")]
    FrameOutOfRange { index: usize, count: usize },
    #[error("Pitch {pitch} smaller than one output row ({min} bytes)")]
    InvalidPitch { pitch: usize, min: usize },
    #[error("Destination buffer holds {actual} bytes, frame needs {needed}")]
    DestinationTooSmall { needed: usize, actual: usize },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Presentation sink failed: {0}")]
    Sink(anyhow::Error),
}

impl AviError {
    pub(crate) fn truncated(offset: u64, detail: impl Into<String>) -> Self {
        AviError::TruncatedChunkTree {
            offset,
            detail: detail.into(),
        }
    }

    /// Errors a single frame read can raise once the file has loaded.
    /// Includes I/O failures while reading frame bytes.
    pub fn is_frame_error(&self) -> bool {
        matches!(
            self,
            AviError::TruncatedFrame { .. } | AviError::FrameOutOfRange { .. } | AviError::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AviError>;
