//! Audio device output using cpal and a ring buffer
//!
//! The tick loop pushes committed i16 frames into a lock-free SPSC ring;
//! the cpal callback pops whatever is available and pads with silence.
//! Nothing in the callback touches the mixer state.

use anyhow::{Context, Result, anyhow, bail};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};
use tracing::{debug, error};

/// Ring capacity in frames (~170ms at 48kHz)
const RING_FRAMES: usize = 8192;

/// Stereo output stream fed from the tick loop
pub struct DeviceOutput {
    /// Producer side of the ring buffer (tick loop writes here)
    producer: ringbuf::HeapProd<i16>,
    /// The cpal stream (kept alive for the duration)
    _stream: cpal::Stream,
    sample_rate: u32,
}

impl DeviceOutput {
    /// Open the default output device in stereo
    pub fn open() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("No audio output device available"))?;

        let supported = device
            .default_output_config()
            .context("Failed to get default output config")?;
        if supported.channels() != 2 {
            bail!(
                "Default output device has {} channels, stereo required",
                supported.channels()
            );
        }
        let sample_rate = supported.sample_rate().0;
        let sample_format = supported.sample_format();
        let config: cpal::StreamConfig = supported.into();

        let ring = HeapRb::<i16>::new(RING_FRAMES * 2);
        let (producer, mut consumer) = ring.split();

        let on_error = |err: cpal::StreamError| error!("Audio stream error: {}", err);
        let stream = match sample_format {
            cpal::SampleFormat::I16 => device.build_output_stream(
                &config,
                move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                    let popped = consumer.pop_slice(data);
                    data[popped..].fill(0);
                },
                on_error,
                None,
            ),
            cpal::SampleFormat::F32 => {
                let mut temp: Vec<i16> = vec![0; 4096];
                device.build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        if temp.len() < data.len() {
                            temp.resize(data.len(), 0);
                        }
                        let popped = consumer.pop_slice(&mut temp[..data.len()]);
                        for (out, &s) in data.iter_mut().zip(&temp[..popped]) {
                            *out = s as f32 / 32768.0;
                        }
                        data[popped..].fill(0.0);
                    },
                    on_error,
                    None,
                )
            }
            cpal::SampleFormat::U16 => {
                let mut temp: Vec<i16> = vec![0; 4096];
                device.build_output_stream(
                    &config,
                    move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                        if temp.len() < data.len() {
                            temp.resize(data.len(), 0);
                        }
                        let popped = consumer.pop_slice(&mut temp[..data.len()]);
                        for (out, &s) in data.iter_mut().zip(&temp[..popped]) {
                            *out = (s as i32 + 32768) as u16;
                        }
                        // 0x8000 is silence for u16 audio
                        data[popped..].fill(32768);
                    },
                    on_error,
                    None,
                )
            }
            other => bail!("Unsupported sample format: {:?}", other),
        }
        .context("Failed to build audio stream")?;

        stream.play().context("Failed to play audio stream")?;
        debug!("Audio stream started at {} Hz ({:?})", sample_rate, sample_format);

        Ok(Self {
            producer,
            _stream: stream,
            sample_rate,
        })
    }

    /// Queue interleaved stereo samples, dropping what does not fit
    pub fn push_samples(&mut self, samples: &[i16]) {
        let pushed = self.producer.push_slice(samples);
        if pushed < samples.len() {
            debug!(
                "Audio buffer overflow: dropped {} samples",
                samples.len() - pushed
            );
        }
    }

    /// Samples queued but not yet played
    pub fn queued_samples(&self) -> usize {
        self.producer.occupied_len()
    }

    /// Device sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
