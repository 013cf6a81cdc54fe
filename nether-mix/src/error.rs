//! Recoverable error types
//!
//! Only the non-real-time edges (building sounds, loading configuration)
//! report errors. Precondition violations inside the mixer panic instead.

use std::path::PathBuf;

/// Rejected sound data
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SoundError {
    /// A sound must contain at least one frame
    #[error("sound has no frames")]
    Empty,

    /// Left and right channels differ in length
    #[error("channel length mismatch: left has {left} frames, right has {right}")]
    ChannelMismatch { left: usize, right: usize },

    /// Interleaved stereo data must hold whole left/right pairs
    #[error("interleaved stereo data has odd sample count {0}")]
    OddInterleavedLength(usize),
}

/// Configuration loading or validation failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::MixerConfig`]
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config could not be serialized
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is outside its allowed range
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
