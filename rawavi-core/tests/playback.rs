mod common;

use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{init_tracing, AviBuilder};
use rawavi_core::{
    AviError, AviSource, DecodedFrame, FrameErrorPolicy, FrameSink, PixelLayout, PlaybackConfig,
    Player,
};

#[derive(Default)]
struct Recorder {
    frames: Vec<DecodedFrame>,
    quit_after: Option<usize>,
    pitch: Option<usize>,
}

impl FrameSink for Recorder {
    fn pitch(&self, width: u32, layout: PixelLayout) -> usize {
        self.pitch.unwrap_or_else(|| layout.row_bytes(width as usize))
    }

    fn present(&mut self, frame: &DecodedFrame) -> anyhow::Result<()> {
        self.frames.push(frame.clone());
        Ok(())
    }

    fn quit_requested(&mut self) -> bool {
        self.quit_after.is_some_and(|n| self.frames.len() >= n)
    }
}

struct Refusing;

impl FrameSink for Refusing {
    fn present(&mut self, _frame: &DecodedFrame) -> anyhow::Result<()> {
        anyhow::bail!("surface lost")
    }
}

fn source(builder: &AviBuilder) -> AviSource<Cursor<Vec<u8>>> {
    AviSource::new(Cursor::new(builder.build())).expect("source")
}

/// Fails reads that start inside `bad` once armed.
struct BadSector {
    inner: Cursor<Vec<u8>>,
    bad: Range<u64>,
    armed: Arc<AtomicBool>,
}

impl Read for BadSector {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.armed.load(Ordering::SeqCst) && self.bad.contains(&self.inner.position()) {
            return Err(io::Error::other("bad sector"));
        }
        self.inner.read(buf)
    }
}

impl Seek for BadSector {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Three 1x1 frames; reads of the second fail after the file has loaded.
fn unreadable_second_frame(config: PlaybackConfig) -> Player<BadSector> {
    let builder = AviBuilder::new(1, 1, 24)
        .us_per_frame(1_000)
        .frame(&[1, 2, 3])
        .frame(&[4, 5, 6])
        .frame(&[7, 8, 9]);
    let armed = Arc::new(AtomicBool::new(false));
    let mut reader = BadSector {
        inner: Cursor::new(builder.build()),
        bad: 0..0,
        armed: armed.clone(),
    };
    let index = rawavi_core::parse(&mut reader).expect("parse").index;
    let entry = *index.get(1).expect("entry");
    reader.bad = entry.offset..entry.offset + u64::from(entry.size);

    let source = AviSource::new(reader).expect("source");
    armed.store(true, Ordering::SeqCst);
    Player::new(source, config)
}

#[test]
fn plays_every_frame_at_cadence() {
    init_tracing();
    let builder = AviBuilder::new(1, 1, 24)
        .us_per_frame(5_000)
        .frame(&[1, 2, 3])
        .frame(&[4, 5, 6])
        .frame(&[7, 8, 9]);
    let mut player = Player::new(source(&builder), PlaybackConfig::default());
    let mut sink = Recorder::default();

    let started = Instant::now();
    let stats = player.run(&mut sink).expect("run");
    assert_eq!(stats.presented, 3);
    assert!(!stats.cancelled);
    // First frame is immediate, two more intervals follow.
    assert!(started.elapsed() >= Duration::from_millis(10));
    assert_eq!(sink.frames[2].data, vec![9, 8, 7]);
    assert!(!player.clock().has_next());
}

#[test]
fn quit_request_halts_playback() {
    let builder = AviBuilder::new(1, 1, 24)
        .us_per_frame(1_000)
        .frame(&[0; 3])
        .frame(&[0; 3])
        .frame(&[0; 3]);
    let mut player = Player::new(source(&builder), PlaybackConfig::default());
    let mut sink = Recorder {
        quit_after: Some(1),
        ..Recorder::default()
    };

    let stats = player.run(&mut sink).expect("run");
    assert!(stats.cancelled);
    assert_eq!(stats.presented, 1);
    assert_eq!(player.clock().cursor(), 1);
}

#[test]
fn stop_handle_halts_before_first_frame() {
    let builder = AviBuilder::new(1, 1, 24).frame(&[0; 3]);
    let mut player = Player::new(source(&builder), PlaybackConfig::default());
    player.stop_handle().stop();
    let mut sink = Recorder::default();
    let stats = player.run(&mut sink).expect("run");
    assert!(stats.cancelled);
    assert!(sink.frames.is_empty());
}

#[test]
fn truncated_frame_skipped_by_default() {
    let builder = AviBuilder::new(2, 1, 24)
        .us_per_frame(1_000)
        .frame(&[0; 6])
        .frame(&[0; 4])
        .frame(&[0; 6]);
    let mut player = Player::new(source(&builder), PlaybackConfig::default());
    let mut sink = Recorder::default();
    let stats = player.run(&mut sink).expect("run");
    assert_eq!(stats.presented, 2);
    assert_eq!(stats.skipped, 1);
}

#[test]
fn truncated_frame_aborts_when_configured() {
    let builder = AviBuilder::new(2, 1, 24)
        .us_per_frame(1_000)
        .frame(&[0; 6])
        .frame(&[0; 4]);
    let config = PlaybackConfig {
        on_frame_error: FrameErrorPolicy::Abort,
        ..PlaybackConfig::default()
    };
    let mut player = Player::new(source(&builder), config);
    let mut sink = Recorder::default();
    let err = player.run(&mut sink).unwrap_err();
    assert!(matches!(err, AviError::TruncatedFrame { .. }));
    assert_eq!(sink.frames.len(), 1);
}

#[test]
fn unreadable_frame_skipped_by_default() {
    let mut player = unreadable_second_frame(PlaybackConfig::default());
    let mut sink = Recorder::default();
    let stats = player.run(&mut sink).expect("run");
    assert_eq!(stats.presented, 2);
    assert_eq!(stats.skipped, 1);
    assert_eq!(sink.frames[1].data, vec![9, 8, 7]);
}

#[test]
fn unreadable_frame_aborts_when_configured() {
    let config = PlaybackConfig {
        on_frame_error: FrameErrorPolicy::Abort,
        ..PlaybackConfig::default()
    };
    let mut player = unreadable_second_frame(config);
    let mut sink = Recorder::default();
    let err = player.run(&mut sink).unwrap_err();
    assert!(matches!(err, AviError::Io(_)));
    assert_eq!(sink.frames.len(), 1);
}

#[test]
fn sink_pitch_is_honored() {
    let builder = AviBuilder::new(1, -2, 24)
        .us_per_frame(1_000)
        .frame(&[1, 2, 3, 4, 5, 6]);
    let mut player = Player::new(source(&builder), PlaybackConfig::default());
    let mut sink = Recorder {
        pitch: Some(8),
        ..Recorder::default()
    };
    player.run(&mut sink).expect("run");
    let frame = &sink.frames[0];
    assert_eq!(frame.pitch, 8);
    assert_eq!(frame.data.len(), 16);
    assert_eq!(frame.row(0), Some(&[3, 2, 1][..]));
    assert_eq!(frame.row(1), Some(&[6, 5, 4][..]));
    assert_eq!(frame.row(2), None);
}

#[test]
fn sink_failure_surfaces() {
    let builder = AviBuilder::new(1, 1, 24).frame(&[0; 3]);
    let mut player = Player::new(source(&builder), PlaybackConfig::default());
    let err = player.run(&mut Refusing).unwrap_err();
    assert!(matches!(err, AviError::Sink(_)));
    assert!(err.to_string().contains("surface lost"));
}
