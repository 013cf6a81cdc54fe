//! Per-callback mixing
//!
//! [`mix`] blends every active voice of a [`SoundPool`] into one interleaved
//! 16-bit output window:
//!
//! 1. Two zeroed f32 accumulators (left, right) of `count / 4` lanes are
//!    taken from a scratch scope and released when `mix` returns.
//! 2. Each voice mixes `min(count, remaining)` samples, where `remaining` is
//!    the number of output samples left in its source at its current speed.
//! 3. The voice's envelope ramp, scaled by master and bus gain, is applied
//!    per sample; each lane resamples independently by truncating
//!    `position + i * speed` to a source index.
//! 4. Positions advance by the mixed samples, then rewind by the
//!    backend's overwrite tail. Exhausted voices are stopped.
//! 5. Accumulators are rounded, saturated to i16 and interleaved.
//!
//! Stopping a voice only flags its slot and pushes the index on the free
//! list; the slot array never shifts, so the scan visits every slot once.

use tracing::trace;

use crate::batch::{F32x4, LANES};
use crate::output::OutputBuffer;
use crate::pool::{PlayingSound, SoundPool};
use crate::scratch::ScratchArena;

#[cfg(test)]
mod tests;

/// Output frames per conversion step (two batches of four)
const FRAME_ALIGNMENT: usize = 2 * LANES;

/// What one [`mix`] call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixStats {
    /// Voices that contributed samples
    pub voices_mixed: usize,
    /// Voices that reached the end of their source and were stopped
    pub voices_finished: usize,
    /// Largest `samples_to_mix` of any single voice (never above `dst.count()`;
    /// voices sum into shared accumulators, so the bound is per voice)
    pub max_samples_to_mix: usize,
}

/// Mix all active sounds in `pool` into `dst`
///
/// `dt` is the fraction of each envelope's remaining gap closed by this
/// call (see [`crate::envelope`]).
///
/// # Panics
///
/// Panics if `dst.count()` is not a multiple of 8, or if `scratch` cannot
/// hold two accumulators of `dst.count() / 4` lanes.
pub fn mix(
    dst: &mut OutputBuffer,
    pool: &mut SoundPool,
    scratch: &mut ScratchArena,
    dt: f32,
) -> MixStats {
    let count = dst.count();
    assert!(
        count.is_multiple_of(FRAME_ALIGNMENT),
        "mix buffer length {} is not a multiple of {}",
        count,
        FRAME_ALIGNMENT
    );
    let overwrite_count = dst.overwrite_count();
    let chunk_count = count / LANES;

    let mut scope = scratch.scope();
    let (left, right) = scope.push_zeroed(2 * chunk_count).split_at_mut(chunk_count);

    let mut stats = MixStats::default();
    for index in 0..pool.slot_count() {
        let Some(bus) = pool.slot(index).filter(|s| s.is_active()).map(|s| s.bus()) else {
            continue;
        };
        let gain = pool.gain(bus);

        let slot = &mut pool.slots_mut()[index];
        let voice = mix_voice(slot, left, right, count, overwrite_count, gain, dt);

        if voice.samples_mixed > 0 {
            stats.voices_mixed += 1;
            stats.max_samples_to_mix = stats.max_samples_to_mix.max(voice.samples_mixed);
        }
        if voice.exhausted {
            pool.stop_slot(index);
            stats.voices_finished += 1;
        }
    }

    for (frames, (l, r)) in dst
        .samples_mut()
        .chunks_exact_mut(2 * LANES)
        .zip(left.iter().zip(right.iter()))
    {
        frames.copy_from_slice(&F32x4::pack_stereo_i16(*l, *r));
    }

    trace!(
        "mixed {} frames: {} voices, {} finished",
        count, stats.voices_mixed, stats.voices_finished
    );
    stats
}

/// Result of mixing one voice
struct VoiceMix {
    samples_mixed: usize,
    exhausted: bool,
}

/// Accumulate one voice into the lane buffers and advance it
fn mix_voice(
    slot: &mut PlayingSound,
    left: &mut [F32x4],
    right: &mut [F32x4],
    count: usize,
    overwrite_count: usize,
    gain: f32,
    dt: f32,
) -> VoiceMix {
    let sound = &*slot.sound;
    let frames = sound.count();
    let speed = slot.speed;
    let position = slot.position;
    debug_assert!(
        (0.0..frames as f32).contains(&position),
        "slot {} position {} outside 0..{}",
        slot.index,
        position,
        frames
    );

    let remaining = ((frames as f32 - position) / speed).round() as usize;
    if remaining == 0 {
        // Less than half an output sample left at this speed
        return VoiceMix {
            samples_mixed: 0,
            exhausted: true,
        };
    }
    if count == 0 {
        // Empty window: nothing consumed, envelope and position untouched
        return VoiceMix {
            samples_mixed: 0,
            exhausted: false,
        };
    }
    let samples_to_mix = count.min(remaining);

    let ramp = slot.envelope.ramp(dt, samples_to_mix);
    let mixed = ramp.with_gain(gain);
    let mut volume_l = F32x4::ramp(mixed.start.x, mixed.per_sample.x);
    let mut volume_r = F32x4::ramp(mixed.start.y, mixed.per_sample.y);
    let step_l = F32x4::splat(LANES as f32 * mixed.per_sample.x);
    let step_r = F32x4::splat(LANES as f32 * mixed.per_sample.y);

    let src_left = sound.left();
    let src_right = sound.right();
    let last_frame = frames - 1;

    for (chunk, (acc_l, acc_r)) in left
        .iter_mut()
        .zip(right.iter_mut())
        .take(samples_to_mix.div_ceil(LANES))
        .enumerate()
    {
        let mut gathered_l = [0.0f32; LANES];
        let mut gathered_r = [0.0f32; LANES];
        for lane in 0..LANES {
            let sample = chunk * LANES + lane;
            if sample >= samples_to_mix {
                break;
            }
            let src = ((position + sample as f32 * speed) as usize).min(last_frame);
            gathered_l[lane] = src_left[src] as f32;
            gathered_r[lane] = src_right[src] as f32;
        }

        *acc_l = acc_l.mul_add(F32x4::from_array(gathered_l), volume_l);
        *acc_r = acc_r.mul_add(F32x4::from_array(gathered_r), volume_r);
        volume_l += step_l;
        volume_r += step_r;
    }

    slot.envelope.commit(dt);
    slot.position += samples_to_mix as f32 * speed;
    slot.position -= overwrite_count as f32 * speed;

    VoiceMix {
        samples_mixed: samples_to_mix,
        exhausted: samples_to_mix == remaining,
    }
}
