//! Output buffer exchanged with the platform audio backend
//!
//! Each tick the backend asks for `count` frames starting at its write
//! cursor. Only the first `count - overwrite_count` frames are consumed
//! before the next tick; the tail is mixed again next time from the same
//! source positions. The mixer rewinds each voice by `overwrite_count`
//! frames to account for that.

use tracing::debug;

/// Interleaved 16-bit stereo destination for [`crate::mix`]
#[derive(Debug, Clone)]
pub struct OutputBuffer {
    samples: Vec<i16>,
    count: usize,
    overwrite_count: usize,
}

impl OutputBuffer {
    /// Allocate room for up to `max_frames` frames
    pub fn new(max_frames: usize) -> Self {
        Self {
            samples: vec![0; max_frames * 2],
            count: 0,
            overwrite_count: 0,
        }
    }

    /// Retarget the write window for the next mix
    ///
    /// Never reallocates.
    ///
    /// # Panics
    ///
    /// Panics if `count` exceeds the allocated frames or
    /// `overwrite_count > count`.
    pub fn prepare(&mut self, count: usize, overwrite_count: usize) {
        assert!(
            count * 2 <= self.samples.len(),
            "output window of {} frames exceeds buffer capacity of {}",
            count,
            self.samples.len() / 2
        );
        assert!(
            overwrite_count <= count,
            "overwrite_count {} exceeds count {}",
            overwrite_count,
            count
        );
        self.count = count;
        self.overwrite_count = overwrite_count;
    }

    /// Prepare for a [`WriteWindow`]
    pub fn prepare_window(&mut self, window: WriteWindow) {
        self.prepare(window.count, window.overwrite_count);
    }

    /// Frames in the current window
    pub fn count(&self) -> usize {
        self.count
    }

    /// Trailing frames that the next tick rewrites
    pub fn overwrite_count(&self) -> usize {
        self.overwrite_count
    }

    /// Allocated capacity in frames
    pub fn capacity(&self) -> usize {
        self.samples.len() / 2
    }

    /// Interleaved samples of the whole window (`count * 2` values)
    pub fn samples(&self) -> &[i16] {
        &self.samples[..self.count * 2]
    }

    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples[..self.count * 2]
    }

    /// Samples the backend consumes this tick
    pub fn committed(&self) -> &[i16] {
        &self.samples[..(self.count - self.overwrite_count) * 2]
    }
}

/// Frames to request per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteWindow {
    pub count: usize,
    pub overwrite_count: usize,
}

impl WriteWindow {
    /// Window for a fixed tick rate with `latency_frames` of look-ahead
    ///
    /// `count` covers one tick plus the look-ahead, rounded up to a multiple
    /// of 8; everything past one tick is overwritten next time.
    pub fn for_tick(sample_rate: u32, tick_rate: u32, latency_frames: usize) -> Self {
        let frames_per_tick = (sample_rate / tick_rate) as usize;
        let count = (frames_per_tick + latency_frames).next_multiple_of(8);
        let window = Self {
            count,
            overwrite_count: count - frames_per_tick,
        };
        debug!(
            "write window: {} frames per tick, count {}, overwrite {}",
            frames_per_tick, window.count, window.overwrite_count
        );
        window
    }

    /// Frames actually consumed per tick
    pub fn committed_frames(&self) -> usize {
        self.count - self.overwrite_count
    }
}
