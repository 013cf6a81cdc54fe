//! Playing-sound pool
//!
//! A fixed-capacity slot array plus a LIFO free list. `play` reuses the most
//! recently stopped slot before appending a new one; slots are never removed
//! from the array, so a slot's index is stable for its whole life and the
//! mixer can stop voices while scanning without skipping any.
//!
//! Handles carry a generation counter that is bumped on every stop. A handle
//! kept after its sound finished no longer matches the slot, so calls made
//! with it are ignored instead of steering whatever sound reuses the slot.

use std::sync::Arc;

use glam::Vec2;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::config::VolumeConfig;
use crate::envelope::Envelope;
use crate::sound::Sound;

/// Hard limit on concurrently playing sounds
///
/// Exceeding it panics. Callers that may start more voices than this must
/// do their own admission control or voice stealing.
pub const MAX_PLAYING_SOUNDS: usize = 64;

/// Mixing bus a sound plays on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Bus {
    Music,
    Effects,
    Interface,
}

impl Bus {
    pub const ALL: [Bus; 3] = [Bus::Music, Bus::Effects, Bus::Interface];

    #[inline]
    const fn index(self) -> usize {
        match self {
            Bus::Music => 0,
            Bus::Effects => 1,
            Bus::Interface => 2,
        }
    }
}

/// Reference to one playback instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SoundHandle {
    index: u16,
    generation: u32,
}

impl SoundHandle {
    /// Slot index in the pool
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// One slot of the pool
#[derive(Clone, Debug)]
pub struct PlayingSound {
    pub(crate) is_active: bool,
    pub(crate) index: u16,
    pub(crate) generation: u32,
    /// Kept after `stop` and released when the slot is reused by `play`,
    /// so the last reference never drops inside `mix`.
    pub(crate) sound: Arc<Sound>,
    /// Fractional frame cursor into `sound`
    pub(crate) position: f32,
    pub(crate) envelope: Envelope,
    /// Playback-rate multiplier
    pub(crate) speed: f32,
    pub(crate) bus: Bus,
}

impl PlayingSound {
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn sound(&self) -> &Arc<Sound> {
        &self.sound
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn volume(&self) -> Vec2 {
        self.envelope.volume
    }

    pub fn target_volume(&self) -> Vec2 {
        self.envelope.target
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn bus(&self) -> Bus {
        self.bus
    }

    fn handle(&self) -> SoundHandle {
        SoundHandle {
            index: self.index,
            generation: self.generation,
        }
    }
}

/// Pool of playing sounds with master and per-bus gain
#[derive(Debug)]
pub struct SoundPool {
    slots: Vec<PlayingSound>,
    free: SmallVec<[u16; MAX_PLAYING_SOUNDS]>,
    master: f32,
    buses: [f32; Bus::ALL.len()],
}

impl Default for SoundPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundPool {
    /// Empty pool with every gain at 1.0
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(MAX_PLAYING_SOUNDS),
            free: SmallVec::new(),
            master: 1.0,
            buses: [1.0; Bus::ALL.len()],
        }
    }

    /// Empty pool with gains taken from `config`
    pub fn from_config(config: &VolumeConfig) -> Self {
        let mut pool = Self::new();
        pool.set_master_volume(config.master);
        pool.set_bus_volume(Bus::Music, config.music);
        pool.set_bus_volume(Bus::Effects, config.effects);
        pool.set_bus_volume(Bus::Interface, config.interface);
        pool
    }

    /// Start `sound` on `bus` at full volume and normal speed
    ///
    /// # Panics
    ///
    /// Panics if all [`MAX_PLAYING_SOUNDS`] slots are active.
    pub fn play(&mut self, sound: Arc<Sound>, bus: Bus) -> SoundHandle {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                assert!(
                    self.slots.len() < MAX_PLAYING_SOUNDS,
                    "sound pool exhausted: all {} slots are playing",
                    MAX_PLAYING_SOUNDS
                );
                let index = self.slots.len() as u16;
                self.slots.push(PlayingSound {
                    is_active: false,
                    index,
                    generation: 0,
                    sound: Arc::clone(&sound),
                    position: 0.0,
                    envelope: Envelope::unity(),
                    speed: 1.0,
                    bus,
                });
                index
            }
        };

        let slot = &mut self.slots[index as usize];
        debug_assert!(!slot.is_active, "free list held active slot {}", index);
        debug!(
            "play '{}' on {:?} (slot {}, {} frames)",
            sound.label(),
            bus,
            index,
            sound.count()
        );

        slot.is_active = true;
        slot.sound = sound;
        slot.position = 0.0;
        slot.envelope = Envelope::unity();
        slot.speed = 1.0;
        slot.bus = bus;
        slot.handle()
    }

    /// Set a sound's stereo target volume
    ///
    /// With `fade_seconds > 0` the mixer ramps toward `target`; otherwise
    /// the volume changes immediately. Ignored for stale handles.
    pub fn set_volume(&mut self, handle: SoundHandle, target: Vec2, fade_seconds: f32) {
        if let Some(slot) = self.live_slot_mut(handle, "set_volume") {
            slot.envelope.retarget(target, fade_seconds);
        }
    }

    /// Change a sound's playback rate (2.0 = double speed, one octave up)
    ///
    /// Ignored for stale handles.
    ///
    /// # Panics
    ///
    /// Panics if `speed` is not a finite positive number.
    pub fn set_speed(&mut self, handle: SoundHandle, speed: f32) {
        assert!(
            speed.is_finite() && speed > 0.0,
            "playback speed must be finite and positive (got {})",
            speed
        );
        if let Some(slot) = self.live_slot_mut(handle, "set_speed") {
            slot.speed = speed;
        }
    }

    /// Stop a sound and recycle its slot. Ignored for stale handles.
    pub fn stop(&mut self, handle: SoundHandle) {
        if self.live_slot_mut(handle, "stop").is_some() {
            self.stop_slot(handle.index());
        }
    }

    /// Stop every playing sound
    pub fn stop_all(&mut self) {
        for index in 0..self.slots.len() {
            if self.slots[index].is_active {
                self.stop_slot(index);
            }
        }
    }

    /// Whether `handle` still refers to a playing sound
    pub fn is_playing(&self, handle: SoundHandle) -> bool {
        self.slots
            .get(handle.index())
            .is_some_and(|slot| slot.is_active && slot.generation == handle.generation)
    }

    /// Playback state for a live handle
    pub fn get(&self, handle: SoundHandle) -> Option<&PlayingSound> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.is_active && slot.generation == handle.generation)
    }

    /// Slot by index, active or not
    pub fn slot(&self, index: usize) -> Option<&PlayingSound> {
        self.slots.get(index)
    }

    /// Number of slots ever allocated (active or free)
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn master_volume(&self) -> f32 {
        self.master
    }

    pub fn set_master_volume(&mut self, volume: f32) {
        self.master = volume;
    }

    pub fn bus_volume(&self, bus: Bus) -> f32 {
        self.buses[bus.index()]
    }

    pub fn set_bus_volume(&mut self, bus: Bus, volume: f32) {
        self.buses[bus.index()] = volume;
    }

    /// Combined master and bus gain applied by the mixer
    #[inline]
    pub fn gain(&self, bus: Bus) -> f32 {
        self.master * self.buses[bus.index()]
    }

    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [PlayingSound] {
        &mut self.slots
    }

    /// Mark a slot inactive and push it on the free list
    pub(crate) fn stop_slot(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        debug_assert!(slot.is_active, "stop_slot on inactive slot {}", index);
        slot.is_active = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(slot.index);
        trace!("slot {} stopped ('{}')", index, slot.sound.label());
    }

    fn live_slot_mut(&mut self, handle: SoundHandle, op: &str) -> Option<&mut PlayingSound> {
        match self.slots.get_mut(handle.index()) {
            Some(slot) if slot.is_active && slot.generation == handle.generation => Some(slot),
            _ => {
                debug!(
                    "{}: ignoring stale handle (slot {}, generation {})",
                    op, handle.index, handle.generation
                );
                None
            }
        }
    }
}
