//! Playback cadence and frame cursor.
//!
//! The clock never sleeps or reads the time itself; the playback loop
//! measures elapsed time and asks whether a frame is due.

use std::time::Duration;

use crate::pixel::Cadence;

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    interval: Duration,
    cursor: usize,
    total: usize,
}

impl PlaybackClock {
    pub fn new(cadence: Cadence, total_frames: usize) -> Self {
        Self {
            interval: cadence.interval(),
            cursor: 0,
            total: total_frames,
        }
    }

    /// Target time between two presented frames
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Index of the next frame to present
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.total
    }

    pub fn advance(&mut self) {
        self.cursor += 1;
    }

    /// True once `elapsed` since the last render meets the interval.
    pub fn is_due(&self, elapsed: Duration) -> bool {
        elapsed >= self.interval
    }

    /// Presentation time of the frame under the cursor.
    pub fn position(&self) -> Duration {
        self.interval
            .saturating_mul(u32::try_from(self.cursor).unwrap_or(u32::MAX))
    }
}
