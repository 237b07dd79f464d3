//! FIR kernel design
//!
//! The NES mixer output passes through a highpass (DC blocking) stage and a
//! lowpass stage before it reaches the speaker. Both are designed here as
//! Blackman-windowed sinc kernels and combined into a single bandpass kernel by
//! convolution, so one FIR pass applies the whole chain.

use std::f64::consts::PI;

use crate::error::{RenderError, Result};

/// Highpass stop edge (Hz)
pub const HIGHPASS_STOP_EDGE: f32 = 0.0;

/// Highpass pass edge (Hz)
pub const HIGHPASS_PASS_EDGE: f32 = 440.0;

/// Lowpass pass edge (Hz)
pub const LOWPASS_PASS_EDGE: f32 = 14_000.0;

/// Lowpass stop edge (Hz)
pub const LOWPASS_STOP_EDGE: f32 = 26_000.0;

/// Transition width of a Blackman-windowed sinc, in units of `sample_rate / taps`
const BLACKMAN_TRANSITION_FACTOR: f64 = 5.5;

/// Longest kernel a single design may produce
const MAX_TAPS: usize = 1 << 16;

/// Design a highpass kernel.
///
/// Frequencies at or below `stop_edge` are attenuated, frequencies at or above
/// `pass_edge` pass. The cutoff sits midway between the edges. The kernel has
/// odd length and is symmetric about its center tap.
pub fn design_highpass(sample_rate: u32, stop_edge: f32, pass_edge: f32) -> Result<Vec<f32>> {
    let nyquist = check_sample_rate(sample_rate)?;
    let (stop_edge, pass_edge) = (stop_edge as f64, pass_edge as f64);

    if !(stop_edge >= 0.0 && stop_edge < pass_edge) {
        return Err(RenderError::InvalidFilterSpec(format!(
            "highpass stop edge {} Hz must be non-negative and below the pass edge {} Hz",
            stop_edge, pass_edge
        )));
    }
    if pass_edge >= nyquist {
        return Err(RenderError::InvalidFilterSpec(format!(
            "highpass pass edge {} Hz must be below the Nyquist frequency {} Hz",
            pass_edge, nyquist
        )));
    }

    let taps = taps_for_transition(sample_rate, pass_edge - stop_edge)?;
    let cutoff = (stop_edge + pass_edge) / 2.0 / sample_rate as f64;

    // Spectral inversion: an impulse minus the lowpass at the same cutoff
    let mut kernel = windowed_sinc(cutoff, taps);
    for coefficient in kernel.iter_mut() {
        *coefficient = -*coefficient;
    }
    kernel[taps / 2] += 1.0;

    Ok(kernel.into_iter().map(|c| c as f32).collect())
}

/// Design a lowpass kernel.
///
/// Frequencies at or below `pass_edge` pass, frequencies at or above
/// `stop_edge` are attenuated. The stop edge may lie past the Nyquist
/// frequency as long as the cutoff midway between the edges does not; it then
/// only widens the transition band.
pub fn design_lowpass(sample_rate: u32, pass_edge: f32, stop_edge: f32) -> Result<Vec<f32>> {
    let nyquist = check_sample_rate(sample_rate)?;
    let (pass_edge, stop_edge) = (pass_edge as f64, stop_edge as f64);

    if !(pass_edge > 0.0 && pass_edge < stop_edge) {
        return Err(RenderError::InvalidFilterSpec(format!(
            "lowpass pass edge {} Hz must be positive and below the stop edge {} Hz",
            pass_edge, stop_edge
        )));
    }

    let cutoff_hz = (pass_edge + stop_edge) / 2.0;
    if pass_edge >= nyquist || cutoff_hz >= nyquist {
        return Err(RenderError::InvalidFilterSpec(format!(
            "lowpass pass edge {} Hz and cutoff {} Hz must be below the Nyquist frequency {} Hz",
            pass_edge, cutoff_hz, nyquist
        )));
    }

    let taps = taps_for_transition(sample_rate, stop_edge - pass_edge)?;
    let kernel = windowed_sinc(cutoff_hz / sample_rate as f64, taps);

    Ok(kernel.into_iter().map(|c| c as f32).collect())
}

/// Linear convolution of two kernels.
///
/// The result has `a.len() + b.len() - 1` coefficients and applies `a` and `b`
/// in cascade. Convolving with an empty kernel yields an empty kernel.
pub fn convolve(a: &[f32], b: &[f32]) -> Vec<f32> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }

    let mut out = vec![0.0f64; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x as f64 * y as f64;
        }
    }

    out.into_iter().map(|c| c as f32).collect()
}

/// Design the bandpass kernel that emulates the console's analog output stage
pub fn design_bandpass(sample_rate: u32) -> Result<Vec<f32>> {
    let highpass = design_highpass(sample_rate, HIGHPASS_STOP_EDGE, HIGHPASS_PASS_EDGE)?;
    let lowpass = design_lowpass(sample_rate, LOWPASS_PASS_EDGE, LOWPASS_STOP_EDGE)?;

    Ok(convolve(&highpass, &lowpass))
}

fn check_sample_rate(sample_rate: u32) -> Result<f64> {
    if sample_rate == 0 {
        return Err(RenderError::InvalidFilterSpec(
            "sample rate must be positive".to_string(),
        ));
    }

    Ok(sample_rate as f64 / 2.0)
}

/// Odd kernel length needed for a transition band `width` Hz wide
fn taps_for_transition(sample_rate: u32, width: f64) -> Result<usize> {
    let taps = (BLACKMAN_TRANSITION_FACTOR * sample_rate as f64 / width).ceil();

    if !taps.is_finite() || taps > MAX_TAPS as f64 {
        return Err(RenderError::InvalidFilterSpec(format!(
            "transition band of {} Hz is too narrow",
            width
        )));
    }

    let taps = (taps as usize).max(3);
    Ok(taps | 1)
}

/// Blackman-windowed sinc lowpass with unity DC gain.
///
/// `cutoff` is in cycles per sample.
fn windowed_sinc(cutoff: f64, taps: usize) -> Vec<f64> {
    let center = (taps / 2) as f64;
    let last = (taps - 1) as f64;

    let mut kernel: Vec<f64> = (0..taps)
        .map(|i| {
            let m = i as f64 - center;
            let sinc = if m == 0.0 {
                2.0 * cutoff
            } else {
                (2.0 * PI * cutoff * m).sin() / (PI * m)
            };
            let phase = 2.0 * PI * i as f64 / last;
            let window = 0.42 - 0.5 * phase.cos() + 0.08 * (2.0 * phase).cos();

            sinc * window
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for coefficient in kernel.iter_mut() {
        *coefficient /= sum;
    }

    kernel
}
