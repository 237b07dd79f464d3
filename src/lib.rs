//! rustyNES towav - renders NES APU output to WAV
//!
//! The emulator's APU produces one sample in `[0, 1]` per CPU cycle. This
//! library decimates that stream to 44.1 kHz, runs it through a bandpass that
//! approximates the console's analog output stage, and writes mono 16-bit PCM.

pub mod audio;
pub mod capture;
pub mod consumer;
pub mod error;
pub mod timing;

pub use audio::{RenderConfig, WavRenderer};
pub use consumer::{drive, PeakMeter, PeakReport, SampleConsumer};
pub use error::{RenderError, Result};
pub use timing::{TVSystem, SAMPLE_RATE};
