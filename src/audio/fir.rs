//! FIR filter over the decimated sample stream

use std::sync::Arc;

use crate::error::Result;

use super::dsp;

/// Immutable FIR coefficients, cheap to clone and share between renders
#[derive(Debug, Clone, PartialEq)]
pub struct FirKernel {
    coefficients: Arc<[f32]>,
}

impl FirKernel {
    /// Wrap a set of coefficients
    pub fn new(coefficients: Vec<f32>) -> Self {
        FirKernel {
            coefficients: coefficients.into(),
        }
    }

    /// The bandpass kernel for the console output stage at `sample_rate`
    pub fn bandpass(sample_rate: u32) -> Result<Self> {
        Ok(Self::new(dsp::design_bandpass(sample_rate)?))
    }

    /// Filter coefficients, oldest tap first
    pub fn coefficients(&self) -> &[f32] {
        &self.coefficients
    }

    /// Number of taps
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// True for a kernel with no taps
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}

/// Sliding convolution window over the decimated samples
#[derive(Debug, Clone)]
pub struct FirFilter {
    /// Filter coefficients
    kernel: FirKernel,

    /// Ring buffer of the most recent samples, zero-filled at start
    window: Vec<f32>,

    /// Slot that receives the next sample (the oldest sample in the window)
    cursor: usize,
}

impl FirFilter {
    /// Create a filter whose window matches the kernel length
    pub fn new(kernel: FirKernel) -> Self {
        let taps = kernel.len().max(1);

        FirFilter {
            kernel,
            window: vec![0.0; taps],
            cursor: 0,
        }
    }

    /// Push a decimated sample, evicting the oldest one
    #[inline]
    pub fn add(&mut self, sample: f32) {
        self.window[self.cursor] = sample;
        self.cursor = (self.cursor + 1) % self.window.len();
    }

    /// Filter output at the current position.
    ///
    /// The newest sample lines up with the last coefficient.
    pub fn filtered(&self) -> f32 {
        let (newer, older) = self.window.split_at(self.cursor);

        older
            .iter()
            .chain(newer)
            .zip(self.kernel.coefficients())
            .map(|(sample, coefficient)| sample * coefficient)
            .sum()
    }

    /// The kernel this filter applies
    pub fn kernel(&self) -> &FirKernel {
        &self.kernel
    }
}
