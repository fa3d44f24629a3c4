use clap::Parser;
use std::path::PathBuf;

use embedded_hal::delay::DelayNs;
use log::Level;

use demos::input::{check_times, load_values, InputError};
use demos::LogPort;
use heartbeat_gpio::beat::{detect_peak_times, pair_sounds, replay, PairingConfig};
use heartbeat_gpio::errors::Error;
use heartbeat_gpio::port::{GpioPort, StdDelay};
use heartbeat_gpio::{Heartbeat, HeartbeatConfig, PinNumbering};

#[derive(Clone, Copy, clap::ValueEnum, Debug)]
enum Numbering {
    /// wiringPi indices
    Wiring,
    /// Broadcom GPIO numbers
    Bcm,
}

impl From<Numbering> for PinNumbering {
    fn from(v: Numbering) -> Self {
        match v {
            Numbering::Wiring => PinNumbering::Wiring,
            Numbering::Bcm => PinNumbering::Bcm,
        }
    }
}

#[derive(Clone, clap::Subcommand, Debug)]
enum Mode {
    /// A single pulse
    Pulse,
    /// Pulse periodically
    Run {
        /// time between pulse starts
        #[arg(long, default_value_t = 1000)]
        period_ms: u32,

        /// number of pulses, 0 runs forever
        #[arg(short, long, default_value_t = 0)]
        count: u32,
    },
    /// Pulse along with the heart sounds of a recording
    Replay {
        /// file of peak times in seconds, one per line
        #[arg(long, conflicts_with = "samples")]
        peaks: Option<PathBuf>,

        /// file of amplitude samples, one per line
        #[arg(long, requires = "sample_rate")]
        samples: Option<PathBuf>,

        /// sample rate of --samples, in Hz
        #[arg(long)]
        sample_rate: Option<u32>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,

    #[arg(short, long, action = clap::ArgAction::Count)]
    debug: u8,

    /// pin to drive
    #[arg(short, long, default_value_t = HeartbeatConfig::DEFAULT_PIN)]
    pin: u8,

    /// how long the pin stays high
    #[arg(short, long, default_value_t = HeartbeatConfig::DEFAULT_PULSE_WIDTH_MS)]
    width_ms: u32,

    #[arg(short, long, value_enum, default_value_t = Numbering::Wiring)]
    numbering: Numbering,

    /// log pin changes instead of touching hardware
    #[arg(long, default_value = "false")]
    dry_run: bool,
}

#[allow(dead_code)]
#[derive(Debug)]
enum LocalErrors {
    GpioError(Error),
    InputError(InputError),
    NoInput,
    UnorderedPeaks,
    Unsupported,
}

impl From<Error> for LocalErrors {
    fn from(v: Error) -> Self {
        LocalErrors::GpioError(v)
    }
}

impl From<InputError> for LocalErrors {
    fn from(v: InputError) -> Self {
        LocalErrors::InputError(v)
    }
}

fn beat<P: GpioPort, D: DelayNs>(
    mut heartbeat: Heartbeat<P, D>,
    mode: Mode,
) -> Result<(), LocalErrors> {
    heartbeat.setup()?;
    match mode {
        Mode::Pulse => heartbeat.pulse()?,
        Mode::Run { period_ms, count } => {
            let count = (count > 0).then_some(count);
            let missed = heartbeat.pulse_train(count, period_ms)?;
            if missed > 0 {
                log::warn!("{} pulses missed", missed);
            }
        }
        Mode::Replay {
            peaks,
            samples,
            sample_rate,
        } => {
            let times = match (peaks, samples, sample_rate) {
                (Some(path), _, _) => load_values(&path)?,
                (None, Some(path), Some(rate)) => detect_peak_times(&load_values(&path)?, rate),
                _ => return Err(LocalErrors::NoInput),
            };
            if !check_times(&times) {
                return Err(LocalErrors::UnorderedPeaks);
            }
            let beats = pair_sounds(&times, &PairingConfig::default());
            log::info!("{} peaks, {} beats", times.len(), beats.len());
            let missed = replay(&mut heartbeat, &beats)?;
            if missed > 0 {
                log::warn!("{} pulses missed", missed);
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), LocalErrors> {
    let cli = Cli::parse();

    let log_level = match cli.debug {
        1 => Level::Info,
        2 => Level::Debug,
        3 => Level::Trace,
        _ => Level::Warn,
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_level.to_string()),
    )
    .init();
    log::info!("Starting heartbeat on pin {}", cli.pin);

    let config = HeartbeatConfig::new(cli.pin).with_pulse_width_ms(cli.width_ms);
    let numbering = PinNumbering::from(cli.numbering);

    if cli.dry_run {
        return beat(
            Heartbeat::new(LogPort::new(numbering), StdDelay, config),
            cli.mode,
        );
    }

    #[cfg(target_os = "linux")]
    {
        use demos::rppal_port::RppalPort;
        beat(
            Heartbeat::new(RppalPort::new(numbering), rppal::hal::Delay::new(), config),
            cli.mode,
        )
    }
    #[cfg(not(target_os = "linux"))]
    {
        log::error!("No GPIO backend on this platform, use --dry-run");
        Err(LocalErrors::Unsupported)
    }
}
