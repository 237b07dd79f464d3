//! WAV container output
//!
//! Rendered audio is written as a canonical mono 16-bit PCM file: a 44-byte
//! header followed by little-endian samples in emission order.

use std::io::{Seek, Write};

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::error::Result;
use crate::timing::SAMPLE_RATE;

use super::Sample;

/// Format of every rendered file
pub const PCM16_MONO: WavSpec = WavSpec {
    channels: 1,
    sample_rate: SAMPLE_RATE,
    bits_per_sample: 16,
    sample_format: SampleFormat::Int,
};

/// Write `samples` to `sink` as a complete WAV file
pub fn write_pcm16<W: Write + Seek>(sink: W, samples: &[Sample]) -> Result<()> {
    let mut writer = WavWriter::new(sink, PCM16_MONO)?;

    let mut pcm = writer.get_i16_writer(samples.len() as u32);
    for &sample in samples {
        pcm.write_sample(sample);
    }
    pcm.flush()?;

    writer.finalize()?;
    Ok(())
}
