//! Fixed-rate mixing session
//!
//! Owns the engine state (pool, emitters, scratch, output buffer) and
//! advances it one game tick at a time. Each tick moves the orbiting
//! emitter, refreshes emitter volumes, mixes one write window and hands
//! back the committed frames.

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec3;
use nether_mix::{
    Bus, Emitters, MixStats, MixerConfig, OutputBuffer, ScratchArena, Sound, SoundHandle,
    SoundPool, WriteWindow, mix,
};
use tracing::debug;

/// Seconds per full emitter orbit
const ORBIT_PERIOD_SECS: f32 = 4.0;

/// Emitter circling the listener at half the hearing radius
struct Orbit {
    handle: SoundHandle,
    radius: f32,
    angle: f32,
}

pub struct Session {
    pool: SoundPool,
    emitters: Emitters,
    scratch: ScratchArena,
    dst: OutputBuffer,
    window: WriteWindow,
    dt: f32,
    tick_rate: u32,
    orbit: Option<Orbit>,
    listener: Vec3,
    ticks: u64,
}

impl Session {
    pub fn new(config: &MixerConfig) -> Self {
        let window = config.output.window();
        Self {
            pool: SoundPool::from_config(&config.volume),
            emitters: Emitters::new(config.spatial.clone()),
            scratch: ScratchArena::with_capacity(config.output.scratch_lanes()),
            dst: OutputBuffer::new(config.output.max_buffer_frames),
            window,
            dt: 1.0 / config.output.tick_rate as f32,
            tick_rate: config.output.tick_rate,
            orbit: None,
            listener: Vec3::ZERO,
            ticks: 0,
        }
    }

    /// Start a sound on `bus` at `speed`
    pub fn play(&mut self, sound: Arc<Sound>, bus: Bus, speed: f32) -> SoundHandle {
        let handle = self.pool.play(sound, bus);
        self.pool.set_speed(handle, speed);
        handle
    }

    /// Start a sound on an emitter that circles the listener
    pub fn play_orbiting(&mut self, sound: Arc<Sound>, speed: f32) -> SoundHandle {
        let radius = self.emitters.config().hear_radius * 0.5;
        let position = self.listener + Vec3::new(radius, 0.0, 0.0);
        let handle = self.emitters.add(&mut self.pool, sound, position);
        self.pool.set_speed(handle, speed);
        self.orbit = Some(Orbit {
            handle,
            radius,
            angle: 0.0,
        });
        handle
    }

    /// Advance one tick and return the frames consumed this tick
    pub fn tick(&mut self) -> &[i16] {
        if let Some(orbit) = &mut self.orbit {
            orbit.angle = (orbit.angle + TAU * self.dt / ORBIT_PERIOD_SECS) % TAU;
            let offset = Vec3::new(orbit.angle.cos(), 0.0, orbit.angle.sin()) * orbit.radius;
            self.emitters
                .set_position(orbit.handle, self.listener + offset);
        }
        self.emitters.update(&mut self.pool, self.listener, self.dt);

        self.dst.prepare_window(self.window);
        let stats: MixStats = mix(&mut self.dst, &mut self.pool, &mut self.scratch, self.dt);
        self.ticks += 1;
        if stats.voices_finished > 0 {
            debug!(
                "tick {}: {} voice(s) finished, {} still playing",
                self.ticks,
                stats.voices_finished,
                self.pool.active_count()
            );
        }

        self.dst.committed()
    }

    /// Whether any sound is still playing
    pub fn is_playing(&self) -> bool {
        self.pool.active_count() > 0
    }

    pub fn window(&self) -> WriteWindow {
        self.window
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
