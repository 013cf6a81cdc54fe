//! Sound and buffer builders shared by unit tests

use std::sync::Arc;

use crate::output::OutputBuffer;
use crate::sound::Sound;

/// Stereo sound with every sample set to `value`
pub fn constant_sound(frames: usize, value: i16) -> Arc<Sound> {
    Arc::new(Sound::from_channels(vec![value; frames], vec![value; frames]).unwrap())
}

/// Sound whose left channel counts up from 0 and right channel counts down
pub fn ramp_sound(frames: usize) -> Arc<Sound> {
    let left = (0..frames).map(|i| i as i16).collect();
    let right = (0..frames).map(|i| -(i as i16)).collect();
    Arc::new(Sound::from_channels(left, right).unwrap())
}

/// Output buffer prepared for `count` frames
pub fn output(count: usize, overwrite_count: usize) -> OutputBuffer {
    let mut dst = OutputBuffer::new(count);
    dst.prepare(count, overwrite_count);
    dst
}

/// Left channel of an interleaved buffer
pub fn left_channel(samples: &[i16]) -> Vec<i16> {
    samples.iter().step_by(2).copied().collect()
}

/// Right channel of an interleaved buffer
pub fn right_channel(samples: &[i16]) -> Vec<i16> {
    samples.iter().skip(1).step_by(2).copied().collect()
}
