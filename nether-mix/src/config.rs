//! Mixer configuration (TOML)
//!
//! ```toml
//! [volume]
//! master = 0.8
//! music = 1.0
//! effects = 1.0
//! interface = 1.0
//!
//! [spatial]
//! hear_radius = 20.0
//! ear_offset = 1.5
//!
//! [output]
//! sample_rate = 48000
//! tick_rate = 60
//! latency_frames = 64
//! max_buffer_frames = 4096
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::batch::LANES;
use crate::error::ConfigError;
use crate::output::WriteWindow;

/// Complete mixer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MixerConfig {
    /// Master and per-bus gain
    #[serde(default)]
    pub volume: VolumeConfig,
    /// Emitter falloff and microphone placement
    #[serde(default)]
    pub spatial: SpatialConfig,
    /// Output timing and buffer sizing
    #[serde(default)]
    pub output: OutputConfig,
}

/// Master and per-bus gain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Master volume (default: 0.8)
    #[serde(default = "default_master")]
    pub master: f32,
    /// Music bus (default: 1.0)
    #[serde(default = "default_volume")]
    pub music: f32,
    /// Effects bus (default: 1.0)
    #[serde(default = "default_volume")]
    pub effects: f32,
    /// Interface bus (default: 1.0)
    #[serde(default = "default_volume")]
    pub interface: f32,
}

/// Emitter falloff and microphone placement, in world units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialConfig {
    /// Distance at which an ear stops hearing a source (default: 20.0)
    #[serde(default = "default_hear_radius")]
    pub hear_radius: f32,
    /// Distance of each virtual microphone from the listener (default: 1.5)
    #[serde(default = "default_ear_offset")]
    pub ear_offset: f32,
}

/// Output timing and buffer sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Output and source sample rate in Hz (default: 48000)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Game ticks per second (default: 60)
    #[serde(default = "default_tick_rate")]
    pub tick_rate: u32,
    /// Look-ahead frames mixed past each tick and overwritten next time (default: 64)
    #[serde(default = "default_latency_frames")]
    pub latency_frames: usize,
    /// Largest window the output buffer and scratch arena are sized for (default: 4096)
    #[serde(default = "default_max_buffer_frames")]
    pub max_buffer_frames: usize,
}

fn default_master() -> f32 {
    0.8
}
fn default_volume() -> f32 {
    1.0
}
fn default_hear_radius() -> f32 {
    20.0
}
fn default_ear_offset() -> f32 {
    1.5
}
fn default_sample_rate() -> u32 {
    48_000
}
fn default_tick_rate() -> u32 {
    60
}
fn default_latency_frames() -> usize {
    64
}
fn default_max_buffer_frames() -> usize {
    4096
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            master: default_master(),
            music: default_volume(),
            effects: default_volume(),
            interface: default_volume(),
        }
    }
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            hear_radius: default_hear_radius(),
            ear_offset: default_ear_offset(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            tick_rate: default_tick_rate(),
            latency_frames: default_latency_frames(),
            max_buffer_frames: default_max_buffer_frames(),
        }
    }
}

impl OutputConfig {
    /// Per-tick write window
    pub fn window(&self) -> WriteWindow {
        WriteWindow::for_tick(self.sample_rate, self.tick_rate, self.latency_frames)
    }

    /// Scratch lanes needed to mix a `max_buffer_frames` window
    pub fn scratch_lanes(&self) -> usize {
        2 * self.max_buffer_frames / LANES
    }
}

impl MixerConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        debug!("Loaded mixer config from {:?}", path);
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            debug!("No mixer config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value is in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let volumes = [
            ("volume.master", self.volume.master),
            ("volume.music", self.volume.music),
            ("volume.effects", self.volume.effects),
            ("volume.interface", self.volume.interface),
        ];
        for (field, value) in volumes {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(
                    field,
                    format!("must be a finite non-negative gain, got {}", value),
                ));
            }
        }

        if !(self.spatial.hear_radius.is_finite() && self.spatial.hear_radius > 0.0) {
            return Err(invalid(
                "spatial.hear_radius",
                format!("must be positive, got {}", self.spatial.hear_radius),
            ));
        }
        if !(self.spatial.ear_offset.is_finite() && self.spatial.ear_offset >= 0.0) {
            return Err(invalid(
                "spatial.ear_offset",
                format!("must be non-negative, got {}", self.spatial.ear_offset),
            ));
        }

        let output = &self.output;
        if output.sample_rate == 0 {
            return Err(invalid("output.sample_rate", "must be non-zero".to_string()));
        }
        if output.tick_rate == 0 || output.tick_rate > output.sample_rate {
            return Err(invalid(
                "output.tick_rate",
                format!("must be between 1 and sample_rate, got {}", output.tick_rate),
            ));
        }
        if !output.max_buffer_frames.is_multiple_of(8) {
            return Err(invalid(
                "output.max_buffer_frames",
                format!("must be a multiple of 8, got {}", output.max_buffer_frames),
            ));
        }
        let window = output.window();
        if window.count > output.max_buffer_frames {
            return Err(invalid(
                "output.max_buffer_frames",
                format!(
                    "{} is smaller than the {}-frame tick window",
                    output.max_buffer_frames, window.count
                ),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::InvalidValue { field, reason }
}
