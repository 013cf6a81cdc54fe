//! Positional sound emitters
//!
//! An emitter ties a playing sound to a world position. Once per tick
//! [`Emitters::update`] measures the distance from the emitter to two
//! virtual microphones placed left and right of the listener and turns each
//! distance into a target volume for that ear. Panning falls out of the
//! difference between the two ears; there is no separate pan parameter.
//!
//! Emitters whose sound has finished are dropped with swap-remove, so the
//! order of the collection is not stable.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::config::SpatialConfig;
use crate::envelope::distance_gain;
use crate::pool::{Bus, SoundHandle, SoundPool};
use crate::sound::Sound;

/// A playing sound bound to a world position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundEmitter {
    pub position: Vec3,
    pub handle: SoundHandle,
}

/// Per-ear gain for a source at `rel_p` relative to the listener
///
/// Microphones sit at `(-ear_offset, 0, 0)` (left) and
/// `(+ear_offset, 0, 0)` (right) in listener space.
pub fn ear_gains(rel_p: Vec3, config: &SpatialConfig) -> Vec2 {
    let left_mic = Vec3::new(-config.ear_offset, 0.0, 0.0);
    let right_mic = Vec3::new(config.ear_offset, 0.0, 0.0);

    Vec2::new(
        distance_gain(rel_p.distance(left_mic), config.hear_radius),
        distance_gain(rel_p.distance(right_mic), config.hear_radius),
    )
}

/// Dense set of active emitters
#[derive(Debug, Default)]
pub struct Emitters {
    emitters: Vec<SoundEmitter>,
    config: SpatialConfig,
}

impl Emitters {
    pub fn new(config: SpatialConfig) -> Self {
        Self {
            emitters: Vec::new(),
            config,
        }
    }

    /// Play `sound` on the effects bus and bind it to `position`
    pub fn add(&mut self, pool: &mut SoundPool, sound: Arc<Sound>, position: Vec3) -> SoundHandle {
        let handle = pool.play(sound, Bus::Effects);
        self.emitters.push(SoundEmitter { position, handle });
        debug!(
            "emitter bound to slot {} at {:?} ({} emitters)",
            handle.index(),
            position,
            self.emitters.len()
        );
        handle
    }

    /// Move the emitter bound to `handle`. Returns false if none is bound.
    pub fn set_position(&mut self, handle: SoundHandle, position: Vec3) -> bool {
        match self.emitters.iter_mut().find(|e| e.handle == handle) {
            Some(emitter) => {
                emitter.position = position;
                true
            }
            None => false,
        }
    }

    /// Recompute target volumes from the listener position
    ///
    /// `dt` is forwarded as the fade argument of [`SoundPool::set_volume`],
    /// so a positive tick length ramps the change in over the next mix and
    /// `dt = 0` applies it immediately. Emitters whose sound is no longer
    /// playing are removed afterwards.
    pub fn update(&mut self, pool: &mut SoundPool, listener: Vec3, dt: f32) {
        let mut index = 0;
        while index < self.emitters.len() {
            let emitter = self.emitters[index];
            let gains = ear_gains(emitter.position - listener, &self.config);
            pool.set_volume(emitter.handle, gains, dt);

            if pool.is_playing(emitter.handle) {
                index += 1;
            } else {
                debug!("emitter for slot {} finished", emitter.handle.index());
                // The swapped-in emitter is examined on the next pass.
                self.emitters.swap_remove(index);
            }
        }
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SoundEmitter> {
        self.emitters.iter()
    }
}
