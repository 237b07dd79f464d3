//! Clock divider
//!
//! Counts input ticks and fires once every `period` ticks.

use crate::error::{RenderError, Result};

/// Fixed-period tick counter
#[derive(Debug, Clone)]
pub struct ClockDivider {
    /// Ticks seen since the last firing
    counter: usize,

    /// Ticks per firing
    period: usize,
}

impl ClockDivider {
    /// Create a divider that fires every `period` ticks
    pub fn new(period: usize) -> Result<Self> {
        if period == 0 {
            return Err(RenderError::InvalidPeriod { ratio: 0.0 });
        }

        Ok(ClockDivider { counter: 0, period })
    }

    /// Create a divider that reduces `tick_rate` to `sample_rate`
    ///
    /// The period is the ratio of the two rates rounded to the nearest integer.
    pub fn for_rates(tick_rate: f64, sample_rate: u32) -> Result<Self> {
        let ratio = tick_rate / sample_rate as f64;
        let period = ratio.round();

        if !ratio.is_finite() || period < 1.0 || period > u32::MAX as f64 {
            return Err(RenderError::InvalidPeriod { ratio });
        }

        Self::new(period as usize)
    }

    /// Advance by one tick, returning true when a decimated sample is due
    #[inline]
    pub fn clock(&mut self) -> bool {
        self.counter += 1;

        if self.counter == self.period {
            self.counter = 0;
            true
        } else {
            false
        }
    }

    /// Ticks per firing
    pub fn period(&self) -> usize {
        self.period
    }
}
