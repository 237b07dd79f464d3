//! APU capture files
//!
//! A capture is a headerless run of little-endian `f32` values, one per APU
//! tick, as dumped by the emulator's mixer.

use std::io::{ErrorKind, Read, Write};

use crate::error::{RenderError, Result};

/// Size of one captured sample in bytes
pub const SAMPLE_SIZE: usize = 4;

/// Iterator over the samples of a capture
pub struct CaptureReader<R: Read> {
    /// Underlying byte stream
    reader: R,

    /// Bytes consumed so far
    offset: u64,

    /// Set once the stream ended or failed
    done: bool,
}

impl<R: Read> CaptureReader<R> {
    /// Read samples from `reader`
    pub fn new(reader: R) -> Self {
        CaptureReader {
            reader,
            offset: 0,
            done: false,
        }
    }

    /// Fill `buf` as far as the stream allows, returning the number of bytes read
    fn fill(&mut self, buf: &mut [u8; SAMPLE_SIZE]) -> std::io::Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for CaptureReader<R> {
    type Item = Result<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = [0u8; SAMPLE_SIZE];
        match self.fill(&mut buf) {
            Ok(SAMPLE_SIZE) => {
                self.offset += SAMPLE_SIZE as u64;
                Some(Ok(f32::from_le_bytes(buf)))
            }
            Ok(0) => {
                self.done = true;
                None
            }
            Ok(_) => {
                self.done = true;
                Some(Err(RenderError::TruncatedCapture {
                    offset: self.offset,
                }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(RenderError::CaptureIo(e)))
            }
        }
    }
}

/// Write `samples` in capture format
pub fn write_capture<W: Write>(mut writer: W, samples: &[f32]) -> Result<()> {
    for sample in samples {
        writer.write_all(&sample.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}
