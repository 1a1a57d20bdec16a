//! Raw feature files: one little-endian `f32` vector per frame, no header.

use std::io::{self, Read, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::NB_TOTAL_FEATURES;
use crate::error::Result;

const FRAME_BYTES: usize = NB_TOTAL_FEATURES * 4;

/// Appends feature vectors to any byte sink.
#[derive(Debug)]
pub struct FeatureWriter<W: Write> {
    inner: W,
    frames: u64,
}

impl<W: Write> FeatureWriter<W> {
    pub fn new(inner: W) -> Self {
        FeatureWriter { inner, frames: 0 }
    }

    pub fn write_frame(&mut self, features: &[f32; NB_TOTAL_FEATURES]) -> Result<()> {
        for &f in features {
            self.inner.write_f32::<LittleEndian>(f)?;
        }
        self.frames += 1;
        Ok(())
    }

    pub fn frames_written(&self) -> u64 {
        self.frames
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Reads back what a [`FeatureWriter`] produced.
#[derive(Debug)]
pub struct FeatureReader<R: Read> {
    inner: R,
}

impl<R: Read> FeatureReader<R> {
    pub fn new(inner: R) -> Self {
        FeatureReader { inner }
    }

    /// Next frame, or `None` at a clean end of stream.
    ///
    /// A stream that ends inside a frame is an `UnexpectedEof` error.
    pub fn read_frame(&mut self) -> Result<Option<[f32; NB_TOTAL_FEATURES]>> {
        let mut bytes = [0u8; FRAME_BYTES];
        let mut filled = 0;
        while filled < FRAME_BYTES {
            match self.inner.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        if filled == 0 {
            return Ok(None);
        }
        if filled < FRAME_BYTES {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        let mut features = [0.0f32; NB_TOTAL_FEATURES];
        LittleEndian::read_f32_into(&bytes, &mut features);
        Ok(Some(features))
    }
}
