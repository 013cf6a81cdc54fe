//! Nether-Mix: real-time stereo sound pool and mixer
//!
//! A small, allocation-free mixing core for games running on a fixed tick.
//! Application code starts sounds through a [`SoundPool`], optionally binds
//! them to world positions through [`Emitters`], and once per audio callback
//! calls [`mix`] to blend every active voice into one interleaved 16-bit
//! output buffer.
//!
//! # Architecture
//!
//! ```text
//!  game tick ──► SoundPool::play / set_volume / stop
//!            ──► Emitters::update (distance -> per-ear target volume)
//!
//!  audio tick ─► mix(dst, pool, scratch, dt)
//!                  ├─ scratch scope: two f32x4 accumulators
//!                  ├─ per voice: envelope ramp, per-lane resampling, gather
//!                  ├─ round + saturate into dst.samples
//!                  └─ finished voices go back on the free list
//! ```
//!
//! # Audio specs
//!
//! - Stereo 16-bit signed PCM sources at the output sample rate
//! - Nearest-neighbour resampling for `speed != 1.0` (no interpolation)
//! - Hard clamp to the i16 range, no soft clipping or compression
//!
//! # Usage
//!
//! ```
//! use std::sync::Arc;
//! use nether_mix::{Bus, OutputBuffer, ScratchArena, Sound, SoundPool, mix};
//!
//! let sound = Arc::new(Sound::from_interleaved(&[1000; 128]).unwrap());
//!
//! let mut pool = SoundPool::new();
//! let mut scratch = ScratchArena::with_capacity(256);
//! let mut dst = OutputBuffer::new(64);
//!
//! let handle = pool.play(sound, Bus::Effects);
//! dst.prepare(64, 0);
//! mix(&mut dst, &mut pool, &mut scratch, 1.0 / 60.0);
//!
//! assert_eq!(dst.samples()[0], 1000);
//! assert!(!pool.is_playing(handle));
//! ```

pub mod batch;
pub mod config;
pub mod emitter;
pub mod envelope;
pub mod error;
pub mod mixer;
pub mod output;
pub mod pool;
pub mod scratch;
pub mod sound;

#[cfg(test)]
pub(crate) mod test_utils;

pub use batch::F32x4;
pub use config::{MixerConfig, OutputConfig, SpatialConfig, VolumeConfig};
pub use emitter::{Emitters, SoundEmitter, ear_gains};
pub use error::{ConfigError, SoundError};
pub use mixer::{MixStats, mix};
pub use output::{OutputBuffer, WriteWindow};
pub use pool::{Bus, MAX_PLAYING_SOUNDS, PlayingSound, SoundHandle, SoundPool};
pub use scratch::{ScratchArena, ScratchMark, ScratchScope};
pub use sound::Sound;
