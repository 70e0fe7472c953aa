//! Hand-built AVI containers for integration tests.

#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

pub fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

pub fn list(list_type: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let mut body = list_type.to_vec();
    for child in children {
        body.extend_from_slice(child);
    }
    chunk(b"LIST", &body)
}

/// Builds a single-video-stream file.
pub struct AviBuilder {
    pub us_per_frame: u32,
    pub width: i32,
    pub height: i32,
    pub bits: u16,
    pub compression: u32,
    pub palette: Vec<[u8; 4]>,
    pub frames: Vec<Vec<u8>>,
}

impl AviBuilder {
    pub fn new(width: i32, height: i32, bits: u16) -> Self {
        Self {
            us_per_frame: 100_000,
            width,
            height,
            bits,
            compression: 0,
            palette: Vec::new(),
            frames: Vec::new(),
        }
    }

    pub fn us_per_frame(mut self, us: u32) -> Self {
        self.us_per_frame = us;
        self
    }

    pub fn palette(mut self, entries: &[[u8; 4]]) -> Self {
        self.palette = entries.to_vec();
        self
    }

    pub fn frame(mut self, data: &[u8]) -> Self {
        self.frames.push(data.to_vec());
        self
    }

    fn avih(&self) -> Vec<u8> {
        let words = [
            self.us_per_frame,
            0,
            0,
            0x10,
            self.frames.len() as u32,
            0,
            1,
            0,
            self.width.unsigned_abs(),
            self.height.unsigned_abs(),
            0,
            0,
            0,
            0,
        ];
        let data: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        chunk(b"avih", &data)
    }

    fn strh(&self) -> Vec<u8> {
        let mut data = b"vidsDIB ".to_vec();
        data.extend_from_slice(&0u32.to_le_bytes()); // flags
        data.extend_from_slice(&[0u8; 4]); // priority, language
        data.extend_from_slice(&0u32.to_le_bytes()); // initial frames
        data.extend_from_slice(&1u32.to_le_bytes()); // scale
        data.extend_from_slice(&10u32.to_le_bytes()); // rate
        data.extend_from_slice(&0u32.to_le_bytes()); // start
        data.extend_from_slice(&(self.frames.len() as u32).to_le_bytes());
        data.extend_from_slice(&[0u8; 12]); // buffer size, quality, sample size
        data.extend_from_slice(&[0u8; 8]); // rcFrame
        chunk(b"strh", &data)
    }

    fn strf(&self) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&40u32.to_le_bytes());
        data.extend_from_slice(&self.width.to_le_bytes());
        data.extend_from_slice(&self.height.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&self.bits.to_le_bytes());
        data.extend_from_slice(&self.compression.to_le_bytes());
        data.extend_from_slice(&[0u8; 20]);
        for quad in &self.palette {
            data.extend_from_slice(quad);
        }
        chunk(b"strf", &data)
    }

    pub fn build(&self) -> Vec<u8> {
        let hdrl = list(b"hdrl", &[self.avih(), list(b"strl", &[self.strh(), self.strf()])]);
        let frames: Vec<Vec<u8>> = self.frames.iter().map(|f| chunk(b"00dc", f)).collect();
        let movi = list(b"movi", &frames);

        let mut body = b"AVI ".to_vec();
        body.extend_from_slice(&hdrl);
        body.extend_from_slice(&chunk(b"JUNK", &[0u8; 7]));
        body.extend_from_slice(&movi);
        chunk(b"RIFF", &body)
    }

    pub fn write_temp(&self) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(&self.build()).expect("write");
        file.flush().expect("flush");
        file
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("rawavi_core=debug")
        .try_init();
}
