//! WAV decoding into mixer sounds

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use nether_mix::Sound;

/// A decoded WAV file
pub struct LoadedSound {
    pub sound: Arc<Sound>,
    /// Sample rate stored in the file
    pub sample_rate: u32,
}

impl LoadedSound {
    /// Playback speed that corrects for a file recorded at a different rate
    pub fn rate_correction(&self, output_rate: u32) -> f32 {
        self.sample_rate as f32 / output_rate as f32
    }

    /// Duration in seconds at the file's own rate
    pub fn duration_secs(&self) -> f32 {
        self.sound.count() as f32 / self.sample_rate as f32
    }
}

/// Decode a mono or stereo WAV file to 16-bit stereo
pub fn load_wav(path: &Path) -> Result<LoadedSound> {
    let mut reader =
        hound::WavReader::open(path).with_context(|| format!("Failed to load WAV: {:?}", path))?;
    let spec = reader.spec();

    let samples: Vec<i16> = match spec.sample_format {
        hound::SampleFormat::Int => match spec.bits_per_sample {
            16 => reader.samples::<i16>().collect::<Result<_, _>>()?,
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|v| (v as i16) << 8))
                .collect::<Result<_, _>>()?,
            24 | 32 => reader
                .samples::<i32>()
                .map(|s| s.map(|v| (v >> (spec.bits_per_sample - 16)) as i16))
                .collect::<Result<_, _>>()?,
            bits => bail!("Unsupported bit depth {} in {:?}", bits, path),
        },
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * 32767.0) as i16))
            .collect::<Result<_, _>>()?,
    };

    let sound = match spec.channels {
        1 => Sound::from_mono(&samples),
        2 => Sound::from_interleaved(&samples),
        channels => bail!("Unsupported channel count {} in {:?}", channels, path),
    }
    .with_context(|| format!("Invalid audio data in {:?}", path))?;

    let label = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    tracing::info!(
        "Loaded {:?}: {} frames, {} ch, {} Hz",
        path,
        sound.count(),
        spec.channels,
        spec.sample_rate
    );

    Ok(LoadedSound {
        sound: Arc::new(sound.with_label(label)),
        sample_rate: spec.sample_rate,
    })
}
