//! The playable-surface capability and the front/back surface pair.
//!
//! A surface is anything that can load a locator, play, pause and rewind it,
//! and report back when it ended, failed, or buffered enough to play through.
//! Reports travel over the engine's event channel via a `SurfaceReporter`.

use async_trait::async_trait;
use log::{debug, trace};
use tokio::sync::mpsc;

use crate::engine::EngineEvent;
use crate::errors::PlayError;
use crate::model::{AudioLevel, Clip};

/// Physical identity of a surface. Roles (active/idle) move between slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceSlot {
    Front,
    Back,
}

impl SurfaceSlot {
    pub fn other(self) -> SurfaceSlot {
        match self {
            SurfaceSlot::Front => SurfaceSlot::Back,
            SurfaceSlot::Back => SurfaceSlot::Front,
        }
    }
}

/// What a surface can report about its current source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceEventKind {
    Ended,
    Error(String),
    ReadyToPlayThrough,
}

/// Presentational hint for the display layer. Nothing waits on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presentation {
    Hidden,
    Visible,
    FadingOut,
    FadingIn,
}

/// A video output slot. Implementations must not block in any method.
#[async_trait]
pub trait PlayableSurface: Send {
    fn set_source(&mut self, locator: &str);
    /// `level` is already the effective level (0.0 when muted).
    fn set_volume(&mut self, level: f32);
    fn set_muted(&mut self, muted: bool);
    async fn play(&mut self) -> Result<(), PlayError>;
    fn pause(&mut self);
    fn seek_to_zero(&mut self);
    fn set_presentation(&mut self, presentation: Presentation);
}

/// Handle a surface uses to report ended/error/ready for its slot.
#[derive(Clone, Debug)]
pub struct SurfaceReporter {
    slot: SurfaceSlot,
    events: mpsc::UnboundedSender<EngineEvent>,
}

impl SurfaceReporter {
    pub(crate) fn new(slot: SurfaceSlot, events: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { slot, events }
    }

    pub fn slot(&self) -> SurfaceSlot {
        self.slot
    }

    pub fn ended(&self) {
        self.report(SurfaceEventKind::Ended);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.report(SurfaceEventKind::Error(message.into()));
    }

    pub fn ready_to_play_through(&self) {
        self.report(SurfaceEventKind::ReadyToPlayThrough);
    }

    fn report(&self, kind: SurfaceEventKind) {
        trace!("Surface {:?} reports {:?}", self.slot, kind);
        // The engine is gone once the receiver drops; nothing left to notify.
        let _ = self.events.send(EngineEvent::Surface { slot: self.slot, kind });
    }
}

/// The two surfaces and which one currently plays the visible role.
pub struct SurfacePair {
    front: Box<dyn PlayableSurface>,
    back: Box<dyn PlayableSurface>,
    active: SurfaceSlot,
}

impl SurfacePair {
    /// Front starts as the active surface.
    pub fn new(front: Box<dyn PlayableSurface>, back: Box<dyn PlayableSurface>) -> Self {
        Self { front, back, active: SurfaceSlot::Front }
    }

    pub fn active_slot(&self) -> SurfaceSlot {
        self.active
    }

    pub fn idle_slot(&self) -> SurfaceSlot {
        self.active.other()
    }

    pub fn get_mut(&mut self, slot: SurfaceSlot) -> &mut dyn PlayableSurface {
        match slot {
            SurfaceSlot::Front => self.front.as_mut(),
            SurfaceSlot::Back => self.back.as_mut(),
        }
    }

    pub fn active_mut(&mut self) -> &mut dyn PlayableSurface {
        self.get_mut(self.active)
    }

    pub fn idle_mut(&mut self) -> &mut dyn PlayableSurface {
        self.get_mut(self.idle_slot())
    }

    /// Exchange active and idle roles.
    pub fn swap_roles(&mut self) {
        self.active = self.active.other();
        debug!("Surface roles swapped, {:?} is now active", self.active);
    }

    /// Load `clip` into `slot` and apply the current audio level.
    pub fn assign(&mut self, slot: SurfaceSlot, clip: &Clip, audio: AudioLevel) {
        debug!("Assigning '{}' to {:?} surface ({})", clip.filename, slot, clip.locator);
        let surface = self.get_mut(slot);
        surface.set_source(&clip.locator);
        surface.set_volume(audio.effective());
        surface.set_muted(audio.muted);
    }

    /// Apply volume and mute to both surfaces.
    pub fn apply_audio(&mut self, audio: AudioLevel) {
        let level = audio.effective();
        for surface in [self.front.as_mut(), self.back.as_mut()] {
            surface.set_muted(audio.muted);
            surface.set_volume(level);
        }
    }
}
