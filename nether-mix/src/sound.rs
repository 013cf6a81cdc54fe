//! Decoded sound assets

use crate::error::SoundError;

/// Immutable stereo PCM buffer (16-bit signed, output sample rate)
///
/// Playing instances hold an `Arc<Sound>`, so a sound stays alive for as
/// long as any slot references it. Construction guarantees at least one
/// frame and equal channel lengths; the mixer relies on both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sound {
    left: Box<[i16]>,
    right: Box<[i16]>,
    label: Option<String>,
}

impl Sound {
    /// Build a sound from separate channel buffers
    pub fn from_channels(left: Vec<i16>, right: Vec<i16>) -> Result<Self, SoundError> {
        if left.len() != right.len() {
            return Err(SoundError::ChannelMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        if left.is_empty() {
            return Err(SoundError::Empty);
        }

        Ok(Self {
            left: left.into_boxed_slice(),
            right: right.into_boxed_slice(),
            label: None,
        })
    }

    /// Build a sound from interleaved stereo samples (L, R, L, R, ...)
    pub fn from_interleaved(samples: &[i16]) -> Result<Self, SoundError> {
        if !samples.len().is_multiple_of(2) {
            return Err(SoundError::OddInterleavedLength(samples.len()));
        }

        let (left, right) = samples
            .chunks_exact(2)
            .map(|frame| (frame[0], frame[1]))
            .unzip();
        Self::from_channels(left, right)
    }

    /// Build a mono sound, duplicating each sample into both channels
    pub fn from_mono(samples: &[i16]) -> Result<Self, SoundError> {
        Self::from_channels(samples.to_vec(), samples.to_vec())
    }

    /// `frames` frames of digital silence
    pub fn silence(frames: usize) -> Result<Self, SoundError> {
        Self::from_channels(vec![0; frames], vec![0; frames])
    }

    /// Attach a human-readable label used in log output
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label for log output ("<unnamed>" when none was set)
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("<unnamed>")
    }

    /// Number of frames (one left + right pair each)
    #[inline]
    pub fn count(&self) -> usize {
        self.left.len()
    }

    #[inline]
    pub fn left(&self) -> &[i16] {
        &self.left
    }

    #[inline]
    pub fn right(&self) -> &[i16] {
        &self.right
    }
}
