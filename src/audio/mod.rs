//! Audio processing and output
//!
//! This module turns the per-cycle APU output into 44.1 kHz 16-bit PCM: a
//! moving average sampled by a clock divider does the decimation, and a
//! bandpass FIR stands in for the console's analog output stage.

mod averager;
mod divider;
pub mod dsp;
mod fir;
mod renderer;
pub mod wav;

pub use averager::SlidingAverager;
pub use divider::ClockDivider;
pub use fir::{FirFilter, FirKernel};
pub use renderer::{RenderConfig, WavRenderer};

/// Audio sample format (16-bit signed PCM)
pub type Sample = i16;
