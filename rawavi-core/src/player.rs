// PLAYER - Paced sequential playback into a presentation sink
//
// The player owns the frame source and the clock. Each cycle it checks
// for a quit request, then renders the frame under the cursor only if
// the cadence interval has elapsed since the previous render; otherwise
// it idles briefly. Display, windowing and input belong to the sink.

use std::io::{Read, Seek};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::clock::PlaybackClock;
use crate::config::{FrameErrorPolicy, PlaybackConfig};
use crate::convert::DecodedFrame;
use crate::demuxer::AviSource;
use crate::error::{AviError, Result};
use crate::pixel::PixelLayout;

// ============================================================================
// Presentation Sink
// ============================================================================

/// Consumer of decoded frames.
pub trait FrameSink {
    /// Row stride the sink wants for frames of this width and layout.
    fn pitch(&self, width: u32, layout: PixelLayout) -> usize {
        layout.row_bytes(width as usize)
    }

    fn present(&mut self, frame: &DecodedFrame) -> anyhow::Result<()>;

    /// Polled once per playback cycle.
    fn quit_requested(&mut self) -> bool {
        false
    }
}

/// Quit flag that can be raised from any thread.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Player
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStats {
    pub presented: usize,
    pub skipped: usize,
    pub cancelled: bool,
}

pub struct Player<R: Read + Seek> {
    source: AviSource<R>,
    clock: PlaybackClock,
    config: PlaybackConfig,
    stop: StopHandle,
}

impl<R: Read + Seek> Player<R> {
    pub fn new(source: AviSource<R>, config: PlaybackConfig) -> Self {
        let movie = source.movie();
        let clock = PlaybackClock::new(movie.cadence, movie.frame_count());
        Self {
            source,
            clock,
            config,
            stop: StopHandle::new(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn source(&self) -> &AviSource<R> {
        &self.source
    }

    /// Plays from the current cursor until the last frame or a quit request.
    pub fn run<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> Result<PlaybackStats> {
        let layout = self.source.movie().layout;
        let pitch = sink.pitch(layout.width, layout.output_layout());
        let idle = self.config.idle();
        let mut stats = PlaybackStats::default();
        let mut last_render: Option<Instant> = None;

        debug!(
            "Playing {} frames at {:?}/frame, pitch {}",
            self.clock.total(),
            self.clock.interval(),
            pitch
        );

        while self.clock.has_next() {
            if self.stop.is_stopped() || sink.quit_requested() {
                stats.cancelled = true;
                break;
            }

            let now = Instant::now();
            let due = last_render.map_or(true, |last| self.clock.is_due(now - last));
            if !due {
                std::thread::sleep(idle);
                continue;
            }

            let index = self.clock.cursor();
            match self.source.decode_frame(index, pitch) {
                Ok(frame) => {
                    sink.present(&frame).map_err(AviError::Sink)?;
                    stats.presented += 1;
                }
                Err(e) if e.is_frame_error() && self.config.on_frame_error == FrameErrorPolicy::Skip => {
                    warn!("Skipping frame {}: {}", index, e);
                    stats.skipped += 1;
                }
                Err(e) => return Err(e),
            }
            self.clock.advance();
            last_render = Some(now);
        }

        if stats.cancelled {
            info!("Playback stopped at frame {}", self.clock.cursor());
        } else {
            info!(
                "Playback completed: {} presented, {} skipped",
                stats.presented, stats.skipped
            );
        }
        Ok(stats)
    }
}
