//! WAV rendering of the APU output
//!
//! Outputs a single channel of signed 16-bit PCM at 44.1 kHz by sampling the
//! moving average of the APU output, then approximating the filtering the
//! console's mixer and downstream circuitry apply.

use std::io::{Seek, Write};

use log::{debug, info};

use crate::consumer::{SampleConsumer, Stage};
use crate::error::Result;
use crate::timing::{TVSystem, SAMPLE_RATE};

use super::averager::SlidingAverager;
use super::divider::ClockDivider;
use super::fir::{FirFilter, FirKernel};
use super::wav;
use super::Sample;

/// Scale applied to bandpass output, which is centered on zero.
/// Kept below `i16::MAX` to leave some headroom.
const FILTERED_SCALE: f32 = 32000.0;

/// Scale applied to raw `[0, 1]` output before recentering
const RAW_SCALE: f32 = 64000.0;

/// Offset that recenters scaled raw output on zero
const RAW_OFFSET: f32 = 32000.0;

/// Renderer configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Apply the bandpass filter (otherwise the raw average is written)
    pub bandpass_enabled: bool,

    /// Input tick rate (Hz)
    pub tick_rate: f64,
}

impl RenderConfig {
    /// Configuration for captures from the given TV system
    pub fn for_system(tv_system: TVSystem) -> Self {
        RenderConfig {
            bandpass_enabled: true,
            tick_rate: tv_system.cpu_clock_rate(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::for_system(TVSystem::NTSC)
    }
}

/// Per-render state built by `init`
struct Pipeline {
    /// Decides when an output sample is due
    divider: ClockDivider,

    /// Moving average of the raw samples
    moving_average: SlidingAverager,

    /// Bandpass over the decimated samples
    filter: FirFilter,

    /// Finished PCM samples
    samples: Vec<Sample>,
}

/// Sample consumer that renders the APU stream into a WAV file
pub struct WavRenderer<W: Write + Seek> {
    /// Renderer configuration
    config: RenderConfig,

    /// Where the finished file goes
    sink: W,

    /// Kernel supplied up front, otherwise designed at init
    kernel: Option<FirKernel>,

    /// Lifecycle position
    stage: Stage,

    /// Present while running
    pipeline: Option<Pipeline>,
}

impl<W: Write + Seek> WavRenderer<W> {
    /// Create a renderer that will write to `sink` on finish
    pub fn new(sink: W, config: RenderConfig) -> Self {
        WavRenderer {
            config,
            sink,
            kernel: None,
            stage: Stage::Created,
            pipeline: None,
        }
    }

    /// Create a renderer that reuses an already designed kernel
    pub fn with_kernel(sink: W, config: RenderConfig, kernel: FirKernel) -> Self {
        WavRenderer {
            kernel: Some(kernel),
            ..Self::new(sink, config)
        }
    }

    /// Renderer configuration
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Number of PCM samples rendered so far
    pub fn sample_count(&self) -> usize {
        self.pipeline.as_ref().map_or(0, |p| p.samples.len())
    }

    /// Decimation period, once initialized
    pub fn period(&self) -> Option<usize> {
        self.pipeline.as_ref().map(|p| p.divider.period())
    }

    /// Give back the sink
    pub fn into_sink(self) -> W {
        self.sink
    }

    fn build_pipeline(&self) -> Result<Pipeline> {
        let divider = ClockDivider::for_rates(self.config.tick_rate, SAMPLE_RATE)?;
        let kernel = match &self.kernel {
            Some(kernel) => kernel.clone(),
            None => FirKernel::bandpass(SAMPLE_RATE)?,
        };

        debug!(
            "Renderer: tick rate {} Hz, period {}, kernel {} taps, bandpass {}",
            self.config.tick_rate,
            divider.period(),
            kernel.len(),
            if self.config.bandpass_enabled { "on" } else { "off" }
        );

        Ok(Pipeline {
            moving_average: SlidingAverager::new(divider.period()),
            divider,
            filter: FirFilter::new(kernel),
            samples: Vec::new(),
        })
    }
}

impl Pipeline {
    fn consume(&mut self, sample: f32, bandpass_enabled: bool) {
        self.moving_average.add(sample);

        if self.divider.clock() {
            let average = clamped(self.moving_average.compute_average());
            let pcm = if bandpass_enabled {
                self.filter.add(average);
                quantize(self.filter.filtered() * FILTERED_SCALE)
            } else {
                quantize(average * RAW_SCALE - RAW_OFFSET)
            };
            self.samples.push(pcm);
        }
    }
}

/// Saturate to the nominal APU range
#[inline]
fn clamped(sample: f32) -> f32 {
    if sample < 0.0 {
        0.0
    } else if sample > 1.0 {
        1.0
    } else {
        sample
    }
}

/// Round to the nearest 16-bit value.
///
/// Filter output is not clamped: values past the 16-bit range narrow through
/// `i32` and wrap, the way a C-style `(short)` cast does.
#[inline]
fn quantize(value: f32) -> Sample {
    (value.round() as i32) as Sample
}

impl<W: Write + Seek> SampleConsumer for WavRenderer<W> {
    fn init(&mut self) -> Result<()> {
        if self.stage != Stage::Created {
            return Err(self.stage.misuse("init"));
        }

        match self.build_pipeline() {
            Ok(pipeline) => {
                self.pipeline = Some(pipeline);
                self.stage = Stage::Running;
                Ok(())
            }
            Err(e) => {
                self.stage = Stage::Failed;
                Err(e)
            }
        }
    }

    fn consume(&mut self, sample: f32) -> Result<()> {
        match (self.stage, self.pipeline.as_mut()) {
            (Stage::Running, Some(pipeline)) => {
                pipeline.consume(sample, self.config.bandpass_enabled);
                Ok(())
            }
            (stage, _) => Err(stage.misuse("consume")),
        }
    }

    fn finish(&mut self) -> Result<()> {
        if self.stage != Stage::Running {
            return Err(self.stage.misuse("finish"));
        }

        let samples = match self.pipeline.take() {
            Some(pipeline) => pipeline.samples,
            None => return Err(self.stage.misuse("finish")),
        };

        if let Err(e) = wav::write_pcm16(&mut self.sink, &samples) {
            self.stage = Stage::Failed;
            return Err(e);
        }

        self.stage = Stage::Finished;
        info!(
            "Rendered {} samples ({:.2} s)",
            samples.len(),
            samples.len() as f64 / SAMPLE_RATE as f64
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consumer::drive;
    use crate::error::RenderError;
    use std::io::{self, Cursor, SeekFrom};

    fn raw_config() -> RenderConfig {
        RenderConfig {
            bandpass_enabled: false,
            ..RenderConfig::default()
        }
    }

    /// Render `samples` and return the PCM payload
    fn render(config: RenderConfig, samples: &[f32]) -> Vec<i16> {
        let mut renderer = WavRenderer::new(Cursor::new(Vec::new()), config);
        drive(samples.iter().copied().map(Ok), &mut renderer).unwrap();

        let bytes = renderer.into_sink().into_inner();
        bytes[44..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect()
    }

    #[test]
    fn overdriven_filter_output_wraps() {
        let config = RenderConfig::default();
        let mut renderer =
            WavRenderer::with_kernel(Cursor::new(Vec::new()), config, FirKernel::new(vec![2.0]));
        assert!(renderer.config().bandpass_enabled);

        drive((0..41 * 2).map(|_| Ok(1.0)), &mut renderer).unwrap();

        let bytes = renderer.into_sink().into_inner();
        let pcm: Vec<i16> = bytes[44..]
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        // 2.0 * 32000 = 64000, which wraps to 64000 - 65536
        assert_eq!(pcm, vec![-1536; 2]);
    }

    #[test]
    fn quantize_rounds_in_range_and_wraps_outside() {
        assert_eq!(quantize(0.4), 0);
        assert_eq!(quantize(-0.6), -1);
        assert_eq!(quantize(32000.0), 32000);
        assert_eq!(quantize(32768.0), -32768);
        assert_eq!(quantize(-40061.0), 25475);
    }

    #[test]
    fn ntsc_period_is_41() {
        let mut renderer = WavRenderer::new(Cursor::new(Vec::new()), RenderConfig::default());
        assert_eq!(renderer.config().tick_rate, 1789773.0);
        assert_eq!(renderer.period(), None);

        renderer.init().unwrap();
        assert_eq!(renderer.period(), Some(41));
    }

    #[test]
    fn raw_half_scale_renders_silence() {
        let pcm = render(raw_config(), &vec![0.5; 41 * 10]);
        assert_eq!(pcm, vec![0; 10]);
    }

    #[test]
    fn raw_full_scale_renders_headroom_peak() {
        let pcm = render(raw_config(), &vec![1.0; 41 * 10]);
        assert_eq!(pcm, vec![32000; 10]);
    }

    #[test]
    fn raw_zero_renders_negative_peak() {
        let pcm = render(raw_config(), &vec![0.0; 41 * 3]);
        assert_eq!(pcm, vec![-32000; 3]);
    }

    #[test]
    fn out_of_range_input_saturates() {
        let high = render(raw_config(), &vec![3.0; 41 * 2]);
        assert_eq!(high, vec![32000; 2]);

        let low = render(raw_config(), &vec![-2.0; 41 * 2]);
        assert_eq!(low, vec![-32000; 2]);
    }

    #[test]
    fn output_count_is_floor_of_ticks_over_period() {
        for ticks in [0usize, 1, 40, 41, 42, 81, 82, 1000] {
            let samples: Vec<f32> = (0..ticks).map(|i| (i % 7) as f32 / 7.0).collect();
            assert_eq!(render(raw_config(), &samples).len(), ticks / 41);
            assert_eq!(render(RenderConfig::default(), &samples).len(), ticks / 41);
        }
    }

    #[test]
    fn stream_shorter_than_a_period_renders_nothing() {
        let mut renderer = WavRenderer::new(Cursor::new(Vec::new()), RenderConfig::default());
        renderer.init().unwrap();
        for _ in 0..40 {
            renderer.consume(1.0).unwrap();
        }

        assert_eq!(renderer.sample_count(), 0);
        renderer.finish().unwrap();
        assert_eq!(renderer.into_sink().into_inner().len(), 44);
    }

    #[test]
    fn rendering_is_deterministic() {
        let samples: Vec<f32> = (0..41 * 2000)
            .map(|i| if (i / 500) % 2 == 0 { 0.8 } else { 0.1 })
            .collect();

        let first = render(RenderConfig::default(), &samples);
        let second = render(RenderConfig::default(), &samples);

        assert_eq!(first.len(), 2000);
        assert_eq!(first, second);
    }

    #[test]
    fn bandpass_removes_dc_offset() {
        let pcm = render(RenderConfig::default(), &vec![0.5; 41 * 2000]);

        assert_eq!(pcm.len(), 2000);
        for &sample in &pcm[1500..] {
            assert!(sample.abs() <= 4, "residual DC {}", sample);
        }
    }

    #[test]
    fn bandpass_passes_a_square_wave() {
        // 441 Hz square wave from 0 to 1 at the NTSC tick rate
        let half_period = 1789773 / 441 / 2;
        let samples: Vec<f32> = (0..41 * 4000)
            .map(|i| if (i / half_period) % 2 == 0 { 1.0 } else { 0.0 })
            .collect();

        let pcm = render(RenderConfig::default(), &samples);
        let tail = &pcm[2000..];
        let max = tail.iter().copied().max().unwrap();
        let min = tail.iter().copied().min().unwrap();

        assert!(max > 12000, "max {}", max);
        assert!(min < -12000, "min {}", min);
    }

    #[test]
    fn shared_kernel_renders_identically() {
        let samples: Vec<f32> = (0..41 * 800).map(|i| ((i * 31) % 97) as f32 / 97.0).collect();
        let kernel = FirKernel::bandpass(SAMPLE_RATE).unwrap();

        let mut renderer =
            WavRenderer::with_kernel(Cursor::new(Vec::new()), RenderConfig::default(), kernel);
        drive(samples.iter().copied().map(Ok), &mut renderer).unwrap();
        let shared = renderer.into_sink().into_inner();

        let mut renderer = WavRenderer::new(Cursor::new(Vec::new()), RenderConfig::default());
        drive(samples.iter().copied().map(Ok), &mut renderer).unwrap();

        assert_eq!(shared, renderer.into_sink().into_inner());
    }

    #[test]
    fn invalid_tick_rate_fails_init() {
        let config = RenderConfig {
            tick_rate: 1000.0,
            ..RenderConfig::default()
        };
        let mut renderer = WavRenderer::new(Cursor::new(Vec::new()), config);

        assert!(matches!(renderer.init(), Err(RenderError::InvalidPeriod { .. })));
        assert!(matches!(
            renderer.consume(0.5),
            Err(RenderError::Lifecycle { state: "failed", .. })
        ));
    }

    #[test]
    fn lifecycle_misuse_is_reported() {
        let mut renderer = WavRenderer::new(Cursor::new(Vec::new()), RenderConfig::default());

        assert!(matches!(
            renderer.consume(0.5),
            Err(RenderError::Lifecycle { op: "consume", state: "not initialized" })
        ));
        assert!(matches!(renderer.finish(), Err(RenderError::Lifecycle { .. })));

        renderer.init().unwrap();
        assert!(matches!(renderer.init(), Err(RenderError::Lifecycle { op: "init", .. })));

        renderer.finish().unwrap();
        assert!(matches!(
            renderer.consume(0.5),
            Err(RenderError::Lifecycle { state: "finished", .. })
        ));
        assert!(matches!(renderer.finish(), Err(RenderError::Lifecycle { .. })));
    }

    /// Sink that refuses every write
    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "device unplugged"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Seek for BrokenSink {
        fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
            Ok(0)
        }
    }

    #[test]
    fn sink_failure_surfaces_from_finish() {
        let mut renderer = WavRenderer::new(BrokenSink, raw_config());
        renderer.init().unwrap();
        for _ in 0..41 * 5 {
            renderer.consume(0.5).unwrap();
        }

        match renderer.finish() {
            Err(RenderError::SinkIo(hound::Error::IoError(e))) => {
                assert_eq!(e.to_string(), "device unplugged")
            }
            other => panic!("expected sink error, got {:?}", other),
        }
        assert!(matches!(
            renderer.finish(),
            Err(RenderError::Lifecycle { state: "failed", .. })
        ));
    }
}
