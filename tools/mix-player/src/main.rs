//! Nether-Mix player
//!
//! Drives the mixer end to end: decodes WAV files, runs a fixed-rate tick
//! loop and either streams the result to the default audio device or
//! renders it offline to a WAV file.
//!
//! # Usage
//!
//! ```bash
//! mix-player music.wav
//! mix-player jump.wav --speed 1.5 --bus interface
//! mix-player engine.wav --orbit --seconds 8
//! mix-player a.wav b.wav --render mixdown.wav
//! ```
//!
//! Configuration is read from `<config dir>/config.toml` (see
//! `nether_mix::config`) unless `--config` is given.

mod device;
mod session;
mod wav;

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use nether_mix::{Bus, MixerConfig};
use tracing::{info, warn};

use device::DeviceOutput;
use session::Session;
use wav::{LoadedSound, load_wav};

/// Extra time rendered after the longest sound
const TAIL_SECS: f32 = 0.25;

#[derive(Parser)]
#[command(name = "mix-player")]
#[command(
    author,
    version,
    about = "Play or render WAV files through the nether-mix engine"
)]
struct Args {
    /// WAV files to play simultaneously (16-bit PCM recommended)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Config file (default: platform config dir)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Bus the sounds play on
    #[arg(long, value_enum, default_value = "effects")]
    bus: BusArg,

    /// Playback speed multiplier (2.0 = one octave up)
    #[arg(long, default_value = "1.0")]
    speed: f32,

    /// Bind the first file to an emitter circling the listener
    #[arg(long)]
    orbit: bool,

    /// Run length in seconds (default: length of the longest sound)
    #[arg(long)]
    seconds: Option<f32>,

    /// Render to this WAV file instead of playing on the audio device
    #[arg(long, short = 'o')]
    render: Option<PathBuf>,

    /// Override the configured tick rate
    #[arg(long)]
    tick_rate: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BusArg {
    Music,
    Effects,
    Interface,
}

impl From<BusArg> for Bus {
    fn from(bus: BusArg) -> Self {
        match bus {
            BusArg::Music => Bus::Music,
            BusArg::Effects => Bus::Effects,
            BusArg::Interface => Bus::Interface,
        }
    }
}

/// Default config file location
fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.nethercore", "", "NetherMix")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn load_config(args: &Args) -> Result<MixerConfig> {
    let mut config = match &args.config {
        Some(path) => MixerConfig::load(path)?,
        None => match default_config_path() {
            Some(path) => MixerConfig::load_or_default(&path)?,
            None => MixerConfig::default(),
        },
    };

    if let Some(tick_rate) = args.tick_rate {
        config.output.tick_rate = tick_rate;
        config.validate().context("Invalid --tick-rate")?;
    }
    Ok(config)
}

/// Start every sound, returning the expected run time in seconds
fn start_sounds(
    session: &mut Session,
    sounds: &[LoadedSound],
    args: &Args,
    output_rate: u32,
) -> f32 {
    let mut longest = 0.0f32;
    for (i, loaded) in sounds.iter().enumerate() {
        let speed = args.speed * loaded.rate_correction(output_rate);
        if i == 0 && args.orbit {
            session.play_orbiting(loaded.sound.clone(), speed);
        } else {
            session.play(loaded.sound.clone(), args.bus.into(), speed);
        }
        longest = longest.max(loaded.duration_secs() / args.speed);
    }
    longest
}

/// Run ticks for `seconds`, handing each tick's committed frames to `sink`
fn run_ticks(
    session: &mut Session,
    seconds: f32,
    mut sink: impl FnMut(&[i16]) -> Result<()>,
) -> Result<()> {
    let max_ticks = (seconds * session.tick_rate() as f32).ceil() as u64;
    while session.ticks() < max_ticks {
        sink(session.tick())?;
    }
    Ok(())
}

fn render(config: &MixerConfig, sounds: &[LoadedSound], args: &Args, path: &Path) -> Result<()> {
    let sample_rate = config.output.sample_rate;
    let mut session = Session::new(config);
    let length = start_sounds(&mut session, sounds, args, sample_rate);

    let spec = hound::WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create output: {:?}", path))?;

    let seconds = args.seconds.unwrap_or(length + TAIL_SECS);
    run_ticks(&mut session, seconds, |frames| {
        for &sample in frames {
            writer.write_sample(sample)?;
        }
        Ok(())
    })?;
    writer.finalize().context("Failed to finalize WAV")?;
    if session.is_playing() {
        warn!("Render stopped with sounds still playing");
    }

    info!(
        "Rendered {:.2}s ({} ticks) to {:?}",
        seconds,
        session.ticks(),
        path
    );
    Ok(())
}

fn play(config: &mut MixerConfig, sounds: &[LoadedSound], args: &Args) -> Result<()> {
    let mut device = DeviceOutput::open()?;
    if device.sample_rate() != config.output.sample_rate {
        info!(
            "Device runs at {} Hz, overriding configured {} Hz",
            device.sample_rate(),
            config.output.sample_rate
        );
        config.output.sample_rate = device.sample_rate();
        config
            .validate()
            .context("Config invalid at device sample rate")?;
    }

    let mut session = Session::new(config);
    let length = start_sounds(&mut session, sounds, args, device.sample_rate());
    let seconds = args.seconds.unwrap_or(length + TAIL_SECS);

    // Keep roughly four ticks queued ahead of the device
    let target_queue = session.window().committed_frames() * 2 * 4;
    run_ticks(&mut session, seconds, |frames| {
        while device.queued_samples() > target_queue {
            thread::sleep(Duration::from_millis(1));
        }
        device.push_samples(frames);
        Ok(())
    })?;

    while device.queued_samples() > 0 {
        thread::sleep(Duration::from_millis(5));
    }
    info!("Playback finished after {} ticks", session.ticks());
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if !(args.speed.is_finite() && args.speed > 0.0) {
        bail!("--speed must be a positive number (got {})", args.speed);
    }

    let mut config = load_config(&args)?;
    let sounds = args
        .files
        .iter()
        .map(|path| load_wav(path))
        .collect::<Result<Vec<_>>>()?;

    if sounds.len() > nether_mix::MAX_PLAYING_SOUNDS {
        bail!(
            "{} files given, at most {} can play at once",
            sounds.len(),
            nether_mix::MAX_PLAYING_SOUNDS
        );
    }
    if args.orbit && args.bus != BusArg::Effects {
        warn!("--orbit plays the first file on the effects bus");
    }

    match &args.render {
        Some(path) => render(&config, &sounds, &args, path),
        None => play(&mut config, &sounds, &args),
    }
}
