//! Stereo volume envelopes
//!
//! A playing sound carries a current and a target volume per channel. Each
//! mix call closes `dt` of the remaining gap:
//!
//! ```text
//! per_buffer = (target - volume) * dt
//! per_sample = per_buffer / samples_to_mix
//! ```
//!
//! so a sound approaches its target geometrically across calls. With
//! `dt = 1` the gap closes in a single call. The `fade_seconds` argument to
//! [`Envelope::retarget`] only selects between ramping and jumping; it is
//! not a duration.

use glam::Vec2;

/// Current and target stereo gain (x = left, y = right)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    pub volume: Vec2,
    pub target: Vec2,
}

impl Default for Envelope {
    fn default() -> Self {
        Self::unity()
    }
}

impl Envelope {
    /// Full volume on both channels, nothing pending
    pub const fn unity() -> Self {
        Self {
            volume: Vec2::ONE,
            target: Vec2::ONE,
        }
    }

    /// Ramp toward `target` when `fade_seconds > 0`, otherwise jump to it
    pub fn retarget(&mut self, target: Vec2, fade_seconds: f32) {
        if fade_seconds > 0.0 {
            self.target = target;
        } else {
            self.volume = target;
            self.target = target;
        }
    }

    /// Ramp for one mix call covering `samples_to_mix` output samples
    ///
    /// `samples_to_mix` must be non-zero.
    pub fn ramp(&self, dt: f32, samples_to_mix: usize) -> VolumeRamp {
        debug_assert!(samples_to_mix > 0, "envelope ramp over zero samples");
        let per_buffer = (self.target - self.volume) * dt;
        VolumeRamp {
            start: self.volume,
            per_sample: per_buffer / samples_to_mix as f32,
            per_buffer,
        }
    }

    /// Advance the volume by one mix call
    ///
    /// Same step as `per_buffer`, written as a lerp so `dt = 1` lands
    /// exactly on the target.
    pub fn commit(&mut self, dt: f32) {
        self.volume = self.volume * (1.0 - dt) + self.target * dt;
    }
}

/// Linear volume ramp across one mix call
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VolumeRamp {
    /// Volume at the first sample
    pub start: Vec2,
    /// Change per output sample
    pub per_sample: Vec2,
    /// Change across the whole call
    pub per_buffer: Vec2,
}

impl VolumeRamp {
    /// Scale the mixed ramp by a bus gain
    ///
    /// `per_buffer` is left untouched: the envelope stores unscaled volume,
    /// so bus changes take effect on the next call without disturbing a
    /// ramp in flight.
    pub fn with_gain(self, gain: f32) -> Self {
        Self {
            start: self.start * gain,
            per_sample: self.per_sample * gain,
            per_buffer: self.per_buffer,
        }
    }
}

/// Linear distance falloff: 1 at the listener, 0 at `radius` and beyond
#[inline]
pub fn distance_gain(distance: f32, radius: f32) -> f32 {
    ((radius - distance) / radius).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retarget_with_fade_keeps_volume() {
        let mut env = Envelope::unity();
        env.retarget(Vec2::new(0.25, 0.5), 0.5);
        assert_eq!(env.volume, Vec2::ONE);
        assert_eq!(env.target, Vec2::new(0.25, 0.5));
    }

    #[test]
    fn test_retarget_without_fade_jumps() {
        let mut env = Envelope::unity();
        env.retarget(Vec2::new(0.25, 0.5), 0.0);
        assert_eq!(env.volume, Vec2::new(0.25, 0.5));
        assert_eq!(env.target, env.volume);
    }

    #[test]
    fn test_dt_one_closes_gap() {
        let mut env = Envelope::unity();
        env.retarget(Vec2::new(0.5, 0.0), 1.0);
        env.commit(1.0);
        assert_eq!(env.volume, env.target);
    }

    #[test]
    fn test_dt_one_is_exact_for_inexact_targets() {
        let mut env = Envelope::unity();
        let target = Vec2::new(0.1, 0.7);
        env.retarget(target, 1.0);
        env.commit(1.0);
        assert_eq!(env.volume, target);
    }

    #[test]
    fn test_fractional_dt_converges_geometrically() {
        let mut env = Envelope::unity();
        env.retarget(Vec2::ZERO, 1.0);

        let ramp = env.ramp(0.5, 8);
        assert_eq!(ramp.per_buffer, Vec2::splat(-0.5));
        assert_eq!(ramp.per_sample, Vec2::splat(-0.0625));
        env.commit(0.5);
        assert_eq!(env.volume, Vec2::splat(0.5));

        env.commit(0.5);
        assert_eq!(env.volume, Vec2::splat(0.25));
    }

    #[test]
    fn test_gain_scales_mixed_ramp_only() {
        let mut env = Envelope::unity();
        env.retarget(Vec2::ZERO, 1.0);
        let ramp = env.ramp(1.0, 4).with_gain(0.5);
        assert_eq!(ramp.start, Vec2::splat(0.5));
        assert_eq!(ramp.per_sample, Vec2::splat(-0.125));
        assert_eq!(ramp.per_buffer, Vec2::splat(-1.0));
    }

    #[test]
    fn test_distance_gain_clamps() {
        assert_eq!(distance_gain(0.0, 10.0), 1.0);
        assert_eq!(distance_gain(5.0, 10.0), 0.5);
        assert_eq!(distance_gain(25.0, 10.0), 0.0);
    }
}
