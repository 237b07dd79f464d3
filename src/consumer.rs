//! Sample consumers
//!
//! The emulation side of the program produces one APU sample per CPU cycle and
//! pushes it into a [`SampleConsumer`]. Rendering to WAV is one consumer; the
//! [`PeakMeter`] that just measures the stream is another.

use log::info;

use crate::error::{RenderError, Result};

/// Something that accepts a stream of raw APU samples.
///
/// Calls must arrive as `init`, then `consume` once per tick, then `finish`.
pub trait SampleConsumer {
    /// Prepare for a new stream
    fn init(&mut self) -> Result<()>;

    /// Accept the next raw sample, nominally in `[0, 1]`
    fn consume(&mut self, sample: f32) -> Result<()>;

    /// End of stream
    fn finish(&mut self) -> Result<()>;
}

/// Play a sample source into `consumer`.
///
/// Stops at the first error from either side without calling `finish`.
/// Returns the number of samples consumed.
pub fn drive<I>(samples: I, consumer: &mut dyn SampleConsumer) -> Result<u64>
where
    I: IntoIterator<Item = Result<f32>>,
{
    consumer.init()?;

    let mut ticks = 0u64;
    for sample in samples {
        consumer.consume(sample?)?;
        ticks += 1;
    }

    consumer.finish()?;
    Ok(ticks)
}

/// Lifecycle position shared by the consumers in this crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stage {
    Created,
    Running,
    Finished,
    Failed,
}

impl Stage {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Stage::Created => "not initialized",
            Stage::Running => "running",
            Stage::Finished => "finished",
            Stage::Failed => "failed",
        }
    }

    /// Error for calling `op` in this stage
    pub(crate) fn misuse(self, op: &'static str) -> RenderError {
        RenderError::Lifecycle {
            op,
            state: self.name(),
        }
    }
}

/// Summary of a measured stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakReport {
    /// Samples seen
    pub ticks: u64,

    /// Smallest sample
    pub min: f32,

    /// Largest sample
    pub max: f32,

    /// Mean of all samples
    pub mean: f64,
}

/// Consumer that measures the raw stream without rendering it
#[derive(Debug)]
pub struct PeakMeter {
    stage: Stage,
    ticks: u64,
    min: f32,
    max: f32,
    sum: f64,
}

impl PeakMeter {
    /// Create a meter that has seen nothing yet
    pub fn new() -> Self {
        PeakMeter {
            stage: Stage::Created,
            ticks: 0,
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
            sum: 0.0,
        }
    }

    /// Measurements, available once the stream has finished and was not empty
    pub fn report(&self) -> Option<PeakReport> {
        if self.stage != Stage::Finished || self.ticks == 0 {
            return None;
        }

        Some(PeakReport {
            ticks: self.ticks,
            min: self.min,
            max: self.max,
            mean: self.sum / self.ticks as f64,
        })
    }
}

impl Default for PeakMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleConsumer for PeakMeter {
    fn init(&mut self) -> Result<()> {
        if self.stage != Stage::Created {
            return Err(self.stage.misuse("init"));
        }

        self.stage = Stage::Running;
        Ok(())
    }

    fn consume(&mut self, sample: f32) -> Result<()> {
        if self.stage != Stage::Running {
            return Err(self.stage.misuse("consume"));
        }

        self.ticks += 1;
        self.min = self.min.min(sample);
        self.max = self.max.max(sample);
        self.sum += sample as f64;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.stage != Stage::Running {
            return Err(self.stage.misuse("finish"));
        }

        self.stage = Stage::Finished;
        match self.report() {
            Some(report) => info!(
                "Measured {} ticks: min {:.4}, max {:.4}, mean {:.4}",
                report.ticks, report.min, report.max, report.mean
            ),
            None => info!("Measured an empty stream"),
        }
        Ok(())
    }
}
