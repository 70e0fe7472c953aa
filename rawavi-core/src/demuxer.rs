// AVI DEMUXER - Uncompressed AVI/RIFF Parser
//
// One forward pass over the chunk tree:
//
// RIFF 'AVI '
// ├── LIST 'hdrl'
// │   ├── avih (main header)
// │   └── LIST 'strl' (per stream)
// │       ├── strh (stream header)
// │       └── strf (BITMAPINFOHEADER [+ palette])
// └── LIST 'movi'
//     ├── 00dc / 00db (video frames)
//     └── ...        (skipped)
//
// Nothing after the movie data is read. Frames are located by scanning
// 'movi' itself; idx1 is not consulted.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::chunk::{
    fourcc_to_string, ChunkReader, ChunkTag, AVIH, HDRL, LIST, MOVI, STRF, STRH, STRL,
    VIDEO_DIB, VIDEO_UNCOMPRESSED,
};
use crate::convert::{self, DecodedFrame, FrameLayout};
use crate::error::{AviError, Result};
use crate::headers::{
    BitmapFormat, MainHeader, Orientation, Palette, RiffHeader, StreamHeader, StreamKind,
};
use crate::pixel::{self, Cadence, PixelFormat};

// ============================================================================
// Frame Index
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameIndexEntry {
    /// Absolute file offset of the frame payload
    pub offset: u64,
    pub size: u32,
}

/// Frame byte ranges in playback order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameIndex {
    entries: Vec<FrameIndexEntry>,
}

impl FrameIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FrameIndexEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameIndexEntry> {
        self.entries.iter()
    }

    fn push(&mut self, entry: FrameIndexEntry) {
        self.entries.push(entry);
    }
}

fn is_video_frame(tag: &ChunkTag) -> bool {
    tag.is(&VIDEO_UNCOMPRESSED) || tag.is(&VIDEO_DIB)
}

// ============================================================================
// Parse Result
// ============================================================================

/// Immutable result of parsing one file.
#[derive(Debug, Clone)]
pub struct AviMovie {
    pub riff: RiffHeader,
    pub main_header: MainHeader,
    pub stream_header: StreamHeader,
    pub bitmap: BitmapFormat,
    pub palette: Option<Palette>,
    pub index: FrameIndex,
    pub layout: FrameLayout,
    pub cadence: Cadence,
}

impl AviMovie {
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    pub fn height(&self) -> u32 {
        self.layout.height
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.layout.format
    }

    pub fn orientation(&self) -> Orientation {
        self.layout.orientation
    }

    pub fn frame_count(&self) -> usize {
        self.index.len()
    }

    /// Decodes already-read frame bytes with this file's layout and palette.
    pub fn decode(&self, raw: &[u8], pitch: usize) -> Result<DecodedFrame> {
        convert::decode(raw, &self.layout, self.palette.as_ref(), pitch)
    }

    pub fn info(&self) -> AviInfo {
        AviInfo {
            width: self.width(),
            height: self.height(),
            fps: self.cadence.fps(),
            total_frames: self.main_header.total_frames,
            indexed_frames: self.index.len(),
            bit_depth: self.bitmap.bit_count,
            compression: self.bitmap.compression,
            duration_secs: self.cadence.duration_secs(self.main_header.total_frames),
            orientation: self.orientation(),
            pixel_format: self.pixel_format(),
            stream_handler: self.stream_header.handler(),
            palette_entries: self.palette.as_ref().map_or(0, Palette::len),
        }
    }
}

/// Caller-facing summary of a parsed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AviInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// As declared by the main header
    pub total_frames: u32,
    pub indexed_frames: usize,
    pub bit_depth: u16,
    pub compression: u32,
    pub duration_secs: f64,
    pub orientation: Orientation,
    pub pixel_format: PixelFormat,
    pub stream_handler: String,
    pub palette_entries: usize,
}

// ============================================================================
// Container Parser
// ============================================================================

/// Video stream state gathered from the header list.
#[derive(Default)]
struct Headers {
    main: Option<MainHeader>,
    video: Option<(StreamHeader, BitmapFormat, Option<Palette>)>,
}

/// Parses a complete AVI file from a seekable byte source.
pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<AviMovie> {
    let mut chunks = ChunkReader::new(reader)?;

    let raw = chunks.read_exact(RiffHeader::SIZE).map_err(|e| match e {
        AviError::TruncatedChunkTree { .. } => AviError::InvalidContainer,
        other => other,
    })?;
    let riff = RiffHeader::parse(&raw)?;

    let end = riff.declared_end();
    if end > chunks.len() {
        return Err(AviError::truncated(
            0,
            format!("RIFF declares {} bytes, file has {}", end, chunks.len()),
        ));
    }

    let mut headers: Option<Headers> = None;
    let mut index: Option<FrameIndex> = None;

    while let Some(tag) = chunks.read_header(end)? {
        if tag.is(&LIST) {
            let (list_type, list_end) = chunks.read_list_type(&tag)?;
            match list_type {
                HDRL if headers.is_none() => {
                    headers = Some(parse_header_list(&mut chunks, list_end)?);
                }
                MOVI => {
                    if headers.is_none() {
                        return Err(AviError::HeaderListMissing);
                    }
                    index = Some(index_frames(&mut chunks, list_end)?);
                    break;
                }
                _ => {
                    debug!("Skipping LIST '{}'", fourcc_to_string(&list_type));
                }
            }
        } else {
            debug!("Skipping chunk '{}' ({} bytes)", fourcc_to_string(&tag.id), tag.size);
        }
        chunks.finish(&tag, end)?;
    }

    let headers = headers.ok_or(AviError::HeaderListMissing)?;
    let main_header = headers.main.ok_or(AviError::MissingChunk(AVIH))?;
    let (stream_header, bitmap, palette) = headers.video.ok_or(AviError::NoVideoStream)?;

    let format = pixel::resolve(&bitmap)?;
    let index = index.filter(|index| !index.is_empty()).ok_or(AviError::NoFramesIndexed)?;

    let (width, height) = frame_dimensions(&main_header, &bitmap);
    let layout = FrameLayout {
        format,
        width,
        height,
        orientation: bitmap.orientation(),
    };
    let cadence = Cadence::from_micros_per_frame(main_header.microsec_per_frame);
    if cadence.is_fallback() {
        warn!("avih declares 0 us/frame, using {} fps", pixel::FALLBACK_FPS);
    }

    info!(
        "AVI: {}x{} {:?} {:?}, {:.3} fps, {} declared / {} indexed frames",
        width,
        height,
        format,
        layout.orientation,
        cadence.fps(),
        main_header.total_frames,
        index.len()
    );

    Ok(AviMovie {
        riff,
        main_header,
        stream_header,
        bitmap,
        palette,
        index,
        layout,
        cadence,
    })
}

fn frame_dimensions(main: &MainHeader, bitmap: &BitmapFormat) -> (u32, u32) {
    if bitmap.width > 0 && bitmap.height != 0 {
        (bitmap.width.unsigned_abs(), bitmap.abs_height())
    } else {
        (main.width, main.height)
    }
}

fn parse_header_list<R: Read + Seek>(
    chunks: &mut ChunkReader<'_, R>,
    end: u64,
) -> Result<Headers> {
    let mut headers = Headers::default();

    while let Some(tag) = chunks.read_header(end)? {
        if tag.is(&AVIH) {
            let data = chunks.read_payload(&tag)?;
            let main = MainHeader::parse(&data, tag.offset)?;
            debug!(
                "avih: {} us/frame, {} frames, {} streams, {}x{}",
                main.microsec_per_frame, main.total_frames, main.streams, main.width, main.height
            );
            headers.main = Some(main);
        } else if tag.is(&LIST) {
            let (list_type, list_end) = chunks.read_list_type(&tag)?;
            if list_type == STRL {
                parse_stream_list(chunks, list_end, &mut headers)?;
            }
        }
        chunks.finish(&tag, end)?;
    }

    Ok(headers)
}

fn parse_stream_list<R: Read + Seek>(
    chunks: &mut ChunkReader<'_, R>,
    end: u64,
    headers: &mut Headers,
) -> Result<()> {
    let mut stream: Option<StreamHeader> = None;

    while let Some(tag) = chunks.read_header(end)? {
        if tag.is(&STRH) {
            let data = chunks.read_payload(&tag)?;
            let header = StreamHeader::parse(&data, tag.offset)?;
            debug!("strh: {:?} stream, handler '{}'", header.kind(), header.handler());
            stream = Some(header);
        } else if tag.is(&STRF) {
            match &stream {
                // Only the first video stream is consumed.
                Some(header) if header.kind() == StreamKind::Video && headers.video.is_none() => {
                    let data = chunks.read_payload(&tag)?;
                    let bitmap = BitmapFormat::parse(&data, tag.offset)?;
                    let palette = read_palette(&bitmap, &data[BitmapFormat::SIZE..]);
                    headers.video = Some((header.clone(), bitmap, palette));
                }
                _ => {}
            }
        }
        chunks.finish(&tag, end)?;
    }

    Ok(())
}

fn read_palette(bitmap: &BitmapFormat, extra: &[u8]) -> Option<Palette> {
    if extra.is_empty() {
        return None;
    }
    if bitmap.bit_count != 8 {
        debug!("Ignoring {} bytes after BITMAPINFOHEADER", extra.len());
        return None;
    }
    let palette = Palette::parse(extra);
    debug!("Read palette with {} entries", palette.len());
    Some(palette)
}

fn index_frames<R: Read + Seek>(chunks: &mut ChunkReader<'_, R>, end: u64) -> Result<FrameIndex> {
    let mut index = FrameIndex::default();

    while let Some(tag) = chunks.read_header(end)? {
        if is_video_frame(&tag) {
            index.push(FrameIndexEntry {
                offset: tag.offset,
                size: tag.size,
            });
        }
        chunks.finish(&tag, end)?;
    }

    debug!("Indexed {} frames", index.len());
    Ok(index)
}

// ============================================================================
// Frame Source
// ============================================================================

/// A byte source paired with its parse result.
pub struct AviSource<R: Read + Seek> {
    reader: R,
    movie: AviMovie,
}

impl AviSource<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> AviSource<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        let movie = parse(&mut reader)?;
        Ok(Self { reader, movie })
    }

    pub fn movie(&self) -> &AviMovie {
        &self.movie
    }

    pub fn info(&self) -> AviInfo {
        self.movie.info()
    }

    pub fn frame_count(&self) -> usize {
        self.movie.frame_count()
    }

    /// Reads the raw bytes of frame `index`.
    pub fn read_frame(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = *self
            .movie
            .index
            .get(index)
            .ok_or(AviError::FrameOutOfRange {
                index,
                count: self.movie.index.len(),
            })?;

        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let mut data = Vec::with_capacity(entry.size as usize);
        self.reader
            .by_ref()
            .take(u64::from(entry.size))
            .read_to_end(&mut data)?;
        if data.len() < entry.size as usize {
            return Err(AviError::TruncatedFrame {
                expected: entry.size as usize,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// Reads and decodes frame `index` with rows `pitch` bytes apart.
    pub fn decode_frame(&mut self, index: usize, pitch: usize) -> Result<DecodedFrame> {
        let raw = self.read_frame(index)?;
        self.movie.decode(&raw, pitch)
    }

    pub fn into_inner(self) -> (R, AviMovie) {
        (self.reader, self.movie)
    }
}

/// Opens and parses a file, returning its summary as JSON.
pub fn probe(path: impl AsRef<Path>) -> Result<serde_json::Value> {
    let source = AviSource::open(path)?;
    Ok(serde_json::to_value(source.info())?)
}
