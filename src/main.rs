//! towav - renders an APU capture to a WAV file
//!
//! This is the command-line entry point. It handles arguments, opens the
//! capture and output files, and drives the selected sample consumer.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use rusty_nes_towav::capture::CaptureReader;
use rusty_nes_towav::{drive, PeakMeter, RenderConfig, TVSystem, WavRenderer};

/// Command line arguments for towav
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Path to the raw APU capture (little-endian f32, one sample per CPU cycle)
    #[clap(value_name = "CAPTURE")]
    capture_path: PathBuf,

    /// Output WAV path (default: the capture path with a .wav extension)
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Capture was taken on a PAL system
    #[clap(long, conflicts_with = "dendy")]
    pal: bool,

    /// Capture was taken on a Dendy system
    #[clap(long)]
    dendy: bool,

    /// Override the input tick rate (Hz)
    #[clap(long, value_name = "HZ")]
    tick_rate: Option<f64>,

    /// Write the raw moving average without the bandpass filter
    #[clap(long)]
    no_bandpass: bool,

    /// Only measure the capture, do not render it
    #[clap(long)]
    analyze: bool,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

impl Args {
    fn render_config(&self) -> RenderConfig {
        let tv_system = if self.pal {
            TVSystem::PAL
        } else if self.dendy {
            TVSystem::Dendy
        } else {
            TVSystem::NTSC
        };

        let mut config = RenderConfig::for_system(tv_system);
        config.bandpass_enabled = !self.no_bandpass;
        if let Some(tick_rate) = self.tick_rate {
            config.tick_rate = tick_rate;
        }
        config
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.capture_path.with_extension("wav"))
    }
}

fn open_capture(path: &Path) -> Result<CaptureReader<BufReader<File>>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open capture: {}", path.display()))?;
    Ok(CaptureReader::new(BufReader::new(file)))
}

fn analyze(args: &Args) -> Result<()> {
    let capture = open_capture(&args.capture_path)?;
    let mut meter = PeakMeter::new();

    drive(capture, &mut meter)
        .with_context(|| format!("Failed to analyze {}", args.capture_path.display()))?;
    Ok(())
}

fn render(args: &Args) -> Result<()> {
    let config = args.render_config();
    let output_path = args.output_path();
    let capture = open_capture(&args.capture_path)?;

    let sink = File::create(&output_path)
        .with_context(|| format!("Failed to create output: {}", output_path.display()))?;
    let mut renderer = WavRenderer::new(BufWriter::new(sink), config);

    info!("Rendering {} -> {}", args.capture_path.display(), output_path.display());

    if let Err(e) = drive(capture, &mut renderer) {
        // A half-rendered file is not a valid WAV, so don't leave one behind
        drop(renderer);
        if let Err(remove_err) = fs::remove_file(&output_path) {
            warn!("Could not remove {}: {}", output_path.display(), remove_err);
        }
        return Err(e).with_context(|| format!("Failed to render {}", args.capture_path.display()));
    }

    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("towav starting...");

    let result = if args.analyze {
        analyze(&args)
    } else {
        render(&args)
    };

    match result {
        Ok(_) => {
            info!("Done");
            Ok(())
        }
        Err(e) => {
            error!("{:#}", e);
            Err(e)
        }
    }
}
