//! Console timing
//!
//! The APU produces one sample per CPU cycle, so the input tick rate of the
//! renderer is the CPU clock of whichever console variant produced the capture.

/// Output sample rate of rendered files (Hz)
pub const SAMPLE_RATE: u32 = 44100;

/// CPU clock rate (Hz) - NTSC
pub const NTSC_CPU_CLOCK_RATE: f64 = 1789773.0;

/// CPU clock rate (Hz) - PAL
pub const PAL_CPU_CLOCK_RATE: f64 = 1662607.0;

/// CPU clock rate (Hz) - Dendy
pub const DENDY_CPU_CLOCK_RATE: f64 = 1773448.0;

/// TV system types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TVSystem {
    /// NTSC (North America, Japan, etc.)
    #[default]
    NTSC,

    /// PAL (Europe, Australia, etc.)
    PAL,

    /// Dendy (Russian NES clone)
    Dendy,
}

impl TVSystem {
    /// APU tick rate for this system (Hz)
    pub fn cpu_clock_rate(self) -> f64 {
        match self {
            TVSystem::NTSC => NTSC_CPU_CLOCK_RATE,
            TVSystem::PAL => PAL_CPU_CLOCK_RATE,
            TVSystem::Dendy => DENDY_CPU_CLOCK_RATE,
        }
    }
}
