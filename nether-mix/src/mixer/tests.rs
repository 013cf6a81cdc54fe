//! Mixer tests

use std::sync::Arc;

use glam::Vec2;

use super::*;
use crate::pool::{Bus, SoundHandle};
use crate::sound::Sound;
use crate::test_utils::{constant_sound, left_channel, output, ramp_sound, right_channel};

fn scratch() -> ScratchArena {
    ScratchArena::with_capacity(1024)
}

/// Mix until `handle` stops, returning the number of calls
fn calls_until_finished(pool: &mut SoundPool, handle: SoundHandle, count: usize) -> usize {
    let mut scratch = scratch();
    let mut dst = output(count, 0);
    let mut calls = 0;
    while pool.is_playing(handle) {
        mix(&mut dst, pool, &mut scratch, 0.0);
        calls += 1;
        assert!(calls < 10_000, "sound never finished");
    }
    calls
}

#[test]
fn test_empty_pool_writes_silence() {
    let mut pool = SoundPool::new();
    let mut dst = output(32, 0);
    dst.samples_mut().fill(1234);

    let stats = mix(&mut dst, &mut pool, &mut scratch(), 1.0 / 60.0);

    assert!(dst.samples().iter().all(|&s| s == 0));
    assert_eq!(stats, MixStats::default());
}

#[test]
fn test_single_voice_copies_source() {
    let mut pool = SoundPool::new();
    let handle = pool.play(ramp_sound(64), Bus::Effects);
    let mut dst = output(16, 0);

    mix(&mut dst, &mut pool, &mut scratch(), 0.0);

    let expected_left: Vec<i16> = (0..16).collect();
    let expected_right: Vec<i16> = (0..16).map(|i| -i).collect();
    assert_eq!(left_channel(dst.samples()), expected_left);
    assert_eq!(right_channel(dst.samples()), expected_right);
    assert_eq!(pool.get(handle).unwrap().position(), 16.0);
}

#[test]
fn test_consecutive_calls_continue_where_previous_stopped() {
    let mut pool = SoundPool::new();
    pool.play(ramp_sound(64), Bus::Effects);
    let mut scratch = scratch();
    let mut dst = output(8, 0);

    mix(&mut dst, &mut pool, &mut scratch, 0.0);
    mix(&mut dst, &mut pool, &mut scratch, 0.0);

    assert_eq!(left_channel(dst.samples()), (8..16).collect::<Vec<i16>>());
}

#[test]
fn test_all_zero_sound_mixes_to_silence() {
    let mut pool = SoundPool::new();
    pool.play(constant_sound(128, 0), Bus::Music);
    let mut dst = output(64, 0);

    mix(&mut dst, &mut pool, &mut scratch(), 1.0);

    assert!(dst.samples().iter().all(|&s| s == 0));
}

#[test]
fn test_output_saturates_instead_of_wrapping() {
    let mut pool = SoundPool::new();
    let loud = Arc::new(
        Sound::from_channels(vec![i16::MAX; 64], vec![i16::MIN; 64]).unwrap(),
    );
    for _ in 0..4 {
        pool.play(Arc::clone(&loud), Bus::Effects);
    }
    let mut dst = output(32, 0);

    mix(&mut dst, &mut pool, &mut scratch(), 0.0);

    assert!(left_channel(dst.samples()).iter().all(|&s| s == i16::MAX));
    assert!(right_channel(dst.samples()).iter().all(|&s| s == i16::MIN));
}

#[test]
fn test_voices_sum() {
    let mut pool = SoundPool::new();
    pool.play(constant_sound(64, 100), Bus::Effects);
    pool.play(constant_sound(64, 250), Bus::Music);
    pool.play(constant_sound(64, -50), Bus::Interface);
    let mut dst = output(16, 0);

    let stats = mix(&mut dst, &mut pool, &mut scratch(), 0.0);

    assert!(dst.samples().iter().all(|&s| s == 300));
    assert_eq!(stats.voices_mixed, 3);
}

#[test]
fn test_bus_and_master_gain_apply() {
    let mut pool = SoundPool::new();
    pool.set_master_volume(0.5);
    pool.set_bus_volume(Bus::Music, 0.5);
    pool.play(constant_sound(64, 1000), Bus::Music);
    let mut dst = output(8, 0);

    mix(&mut dst, &mut pool, &mut scratch(), 0.0);

    assert!(dst.samples().iter().all(|&s| s == 250));
}

#[test]
fn test_envelope_ramps_within_buffer() {
    let mut pool = SoundPool::new();
    let handle = pool.play(constant_sound(64, 1000), Bus::Effects);
    pool.set_volume(handle, Vec2::new(0.0, 1.0), 1.0);
    let mut dst = output(8, 0);

    mix(&mut dst, &mut pool, &mut scratch(), 1.0);

    assert_eq!(
        left_channel(dst.samples()),
        vec![1000, 875, 750, 625, 500, 375, 250, 125]
    );
    assert!(right_channel(dst.samples()).iter().all(|&s| s == 1000));
}

#[test]
fn test_dt_one_reaches_target_in_one_call() {
    let mut pool = SoundPool::new();
    let handle = pool.play(constant_sound(256, 1000), Bus::Effects);
    pool.set_volume(handle, Vec2::new(0.5, 0.25), 1.0);
    let mut dst = output(16, 0);

    mix(&mut dst, &mut pool, &mut scratch(), 1.0);

    let slot = pool.get(handle).unwrap();
    assert_eq!(slot.volume(), slot.target_volume());
    assert_eq!(slot.volume(), Vec2::new(0.5, 0.25));
}

#[test]
fn test_dt_one_lands_exactly_on_inexact_target() {
    let mut pool = SoundPool::new();
    let handle = pool.play(constant_sound(256, 1000), Bus::Effects);
    let target = Vec2::new(0.1, 0.7);
    pool.set_volume(handle, target, 1.0);
    let mut dst = output(16, 0);

    mix(&mut dst, &mut pool, &mut scratch(), 1.0);

    assert_eq!(pool.get(handle).unwrap().volume(), target);
}

#[test]
fn test_fractional_dt_closes_part_of_the_gap() {
    let mut pool = SoundPool::new();
    let handle = pool.play(constant_sound(256, 1000), Bus::Effects);
    pool.set_volume(handle, Vec2::ZERO, 1.0);
    let mut scratch = scratch();
    let mut dst = output(16, 0);

    mix(&mut dst, &mut pool, &mut scratch, 0.5);
    assert_eq!(pool.get(handle).unwrap().volume(), Vec2::splat(0.5));

    mix(&mut dst, &mut pool, &mut scratch, 0.5);
    assert_eq!(pool.get(handle).unwrap().volume(), Vec2::splat(0.25));
}

#[test]
fn test_double_speed_skips_every_other_sample() {
    let mut pool = SoundPool::new();
    let handle = pool.play(ramp_sound(64), Bus::Effects);
    pool.set_speed(handle, 2.0);
    let mut dst = output(8, 0);

    mix(&mut dst, &mut pool, &mut scratch(), 0.0);

    assert_eq!(
        left_channel(dst.samples()),
        vec![0, 2, 4, 6, 8, 10, 12, 14]
    );
    assert_eq!(pool.get(handle).unwrap().position(), 16.0);
}

#[test]
fn test_fractional_speed_truncates_each_lane() {
    let mut pool = SoundPool::new();
    let slow = pool.play(ramp_sound(64), Bus::Effects);
    pool.set_speed(slow, 0.5);
    let mut dst = output(8, 0);
    mix(&mut dst, &mut pool, &mut scratch(), 0.0);
    assert_eq!(left_channel(dst.samples()), vec![0, 0, 1, 1, 2, 2, 3, 3]);

    let mut pool = SoundPool::new();
    let odd = pool.play(ramp_sound(64), Bus::Effects);
    pool.set_speed(odd, 1.5);
    mix(&mut dst, &mut pool, &mut scratch(), 0.0);
    assert_eq!(left_channel(dst.samples()), vec![0, 1, 3, 4, 6, 7, 9, 10]);
    assert_eq!(pool.get(odd).unwrap().position(), 12.0);
}

#[test]
fn test_double_speed_finishes_in_half_the_calls() {
    let mut pool = SoundPool::new();
    let normal = pool.play(constant_sound(256, 1), Bus::Effects);
    let normal_calls = calls_until_finished(&mut pool, normal, 32);

    let mut pool = SoundPool::new();
    let fast = pool.play(constant_sound(256, 1), Bus::Effects);
    pool.set_speed(fast, 2.0);
    let fast_calls = calls_until_finished(&mut pool, fast, 32);

    assert_eq!(normal_calls, 8);
    assert_eq!(fast_calls, 4);
}

#[test]
fn test_short_tail_is_masked_and_voice_stopped() {
    let mut pool = SoundPool::new();
    let handle = pool.play(constant_sound(6, 1000), Bus::Effects);
    let mut dst = output(8, 0);

    let stats = mix(&mut dst, &mut pool, &mut scratch(), 0.0);

    assert_eq!(
        left_channel(dst.samples()),
        vec![1000, 1000, 1000, 1000, 1000, 1000, 0, 0]
    );
    assert!(!pool.is_playing(handle));
    assert_eq!(stats.voices_finished, 1);
    assert_eq!(stats.max_samples_to_mix, 6);
    assert_eq!(pool.free_count(), 1);
}

#[test]
fn test_finished_slot_is_reused_by_next_play() {
    let mut pool = SoundPool::new();
    let first = pool.play(constant_sound(8, 1), Bus::Effects);
    let _keep = pool.play(constant_sound(1024, 1), Bus::Effects);
    let mut dst = output(8, 0);

    mix(&mut dst, &mut pool, &mut scratch(), 0.0);

    assert!(!pool.is_playing(first));
    let next = pool.play(constant_sound(8, 1), Bus::Effects);
    assert_eq!(next.index(), first.index());
}

#[test]
fn test_voice_after_finished_voice_is_still_mixed() {
    let mut pool = SoundPool::new();
    pool.play(constant_sound(4, 100), Bus::Effects);
    let long = pool.play(constant_sound(64, 10), Bus::Effects);
    let mut dst = output(8, 0);

    let stats = mix(&mut dst, &mut pool, &mut scratch(), 0.0);

    assert_eq!(
        left_channel(dst.samples()),
        vec![110, 110, 110, 110, 10, 10, 10, 10]
    );
    assert_eq!(stats.voices_mixed, 2);
    assert!(pool.is_playing(long));
    assert_eq!(pool.get(long).unwrap().position(), 8.0);
}

#[test]
fn test_voice_with_less_than_half_a_sample_left_stops_silently() {
    let mut pool = SoundPool::new();
    let handle = pool.play(constant_sound(1, 1000), Bus::Effects);
    pool.set_speed(handle, 3.0);
    let mut dst = output(8, 0);

    let stats = mix(&mut dst, &mut pool, &mut scratch(), 0.0);

    assert!(dst.samples().iter().all(|&s| s == 0));
    assert!(!pool.is_playing(handle));
    assert_eq!(stats.voices_mixed, 0);
    assert_eq!(stats.voices_finished, 1);
}

#[test]
fn test_overwrite_tail_rewinds_position() {
    let mut pool = SoundPool::new();
    let handle = pool.play(ramp_sound(100), Bus::Effects);
    let mut scratch = scratch();
    let mut dst = output(16, 8);

    mix(&mut dst, &mut pool, &mut scratch, 0.0);
    assert_eq!(pool.get(handle).unwrap().position(), 8.0);

    mix(&mut dst, &mut pool, &mut scratch, 0.0);
    assert_eq!(left_channel(dst.committed()), (8..16).collect::<Vec<i16>>());
}

#[test]
fn test_positions_stay_in_range_and_windows_bounded() {
    let mut pool = SoundPool::new();
    let speeds = [0.5, 1.0, 1.25, 2.0, 3.7];
    let lengths = [40, 97, 128, 333, 1000];
    for (&speed, &frames) in speeds.iter().zip(lengths.iter()) {
        let handle = pool.play(ramp_sound(frames), Bus::Effects);
        pool.set_speed(handle, speed);
    }
    let mut scratch = scratch();
    let mut dst = output(24, 8);

    for _ in 0..200 {
        let stats = mix(&mut dst, &mut pool, &mut scratch, 1.0 / 60.0);
        assert!(stats.max_samples_to_mix <= dst.count());
        for index in 0..pool.slot_count() {
            let slot = pool.slot(index).unwrap();
            if slot.is_active() {
                assert!(slot.position() >= 0.0);
                assert!(slot.position() < slot.sound().count() as f32);
            }
        }
    }
    assert_eq!(pool.active_count(), 0);
}

#[test]
fn test_empty_window_keeps_voices_playing() {
    let mut pool = SoundPool::new();
    let handle = pool.play(ramp_sound(256), Bus::Effects);
    pool.set_volume(handle, Vec2::ZERO, 1.0);
    let mut dst = output(0, 0);

    let stats = mix(&mut dst, &mut pool, &mut scratch(), 1.0);

    assert_eq!(stats, MixStats::default());
    assert!(pool.is_playing(handle));
    let slot = pool.get(handle).unwrap();
    assert_eq!(slot.position(), 0.0);
    assert_eq!(slot.volume(), Vec2::ONE);

    // Next real window picks up from the start
    let mut dst = output(8, 0);
    mix(&mut dst, &mut pool, &mut scratch(), 0.0);
    assert_eq!(left_channel(dst.samples()), (0..8).collect::<Vec<i16>>());
}

#[test]
fn test_scratch_is_released_after_mix() {
    let mut pool = SoundPool::new();
    pool.play(constant_sound(64, 7), Bus::Effects);
    let mut scratch = scratch();
    scratch.push_zeroed(3);
    let mut dst = output(32, 0);

    mix(&mut dst, &mut pool, &mut scratch, 0.0);

    assert_eq!(scratch.used(), 3);
}

#[test]
#[should_panic(expected = "not a multiple of 8")]
fn test_misaligned_buffer_is_fatal() {
    let mut pool = SoundPool::new();
    let mut dst = output(12, 0);
    mix(&mut dst, &mut pool, &mut scratch(), 0.0);
}

#[test]
#[should_panic(expected = "scratch arena exhausted")]
fn test_undersized_scratch_is_fatal() {
    let mut pool = SoundPool::new();
    let mut dst = output(64, 0);
    let mut scratch = ScratchArena::with_capacity(8);
    mix(&mut dst, &mut pool, &mut scratch, 0.0);
}
