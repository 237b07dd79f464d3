//! Moving average over the raw APU output
//!
//! The average is updated on every input tick and sampled by the renderer
//! whenever the clock divider fires, which makes it a boxcar decimation filter.

/// Running average of the last `capacity` samples
#[derive(Debug, Clone)]
pub struct SlidingAverager {
    /// Ring buffer of the samples in the window
    window: Vec<f32>,

    /// Next slot to write (the oldest sample once the window is full)
    cursor: usize,

    /// Number of valid samples in the window
    len: usize,

    /// Sum of the samples currently in the window
    running_sum: f64,
}

impl SlidingAverager {
    /// Create an empty averager over `capacity` samples
    pub fn new(capacity: usize) -> Self {
        SlidingAverager {
            window: vec![0.0; capacity.max(1)],
            cursor: 0,
            len: 0,
            running_sum: 0.0,
        }
    }

    /// Push a sample, evicting the oldest one once the window is full
    #[inline]
    pub fn add(&mut self, sample: f32) {
        if self.len == self.window.len() {
            self.running_sum -= self.window[self.cursor] as f64;
        } else {
            self.len += 1;
        }

        self.window[self.cursor] = sample;
        self.running_sum += sample as f64;
        self.cursor = (self.cursor + 1) % self.window.len();
    }

    /// Average over the full capacity.
    ///
    /// Until the window has filled this reads low, since the divisor is
    /// always the capacity rather than the number of samples seen.
    #[inline]
    pub fn compute_average(&self) -> f32 {
        (self.running_sum / self.window.len() as f64) as f32
    }

    /// Window size
    pub fn capacity(&self) -> usize {
        self.window.len()
    }

    /// Number of samples currently in the window
    pub fn len(&self) -> usize {
        self.len
    }

    /// True until the first sample arrives
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
