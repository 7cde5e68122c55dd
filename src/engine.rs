//! The dual-surface playback engine.
//!
//! One `PlaybackEngine` owns the catalog, the cached configuration, both
//! surfaces and the session indices. Everything that can change them (surface
//! reports, polled configuration, user interaction, timers) arrives as an
//! `EngineEvent` or a deadline on a single loop, so no method ever runs
//! concurrently with another.
//!
//! Transitions follow a fixed protocol: enter `Fading`, start the idle surface,
//! wait `settle_delay`, swap roles, rewind the old surface and preload the
//! following clip into it. Triggers arriving while `Fading` are dropped.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::errors::PlayError;
use crate::model::{catalog_index, Clip, Configuration};
use crate::reconcile::{self, ConfigDelta};
use crate::resolver;
use crate::status::{StatusReporter, StatusSink};
use crate::surface::{PlayableSurface, Presentation, SurfaceEventKind, SurfacePair, SurfaceReporter, SurfaceSlot};

const STARTUP_STATUS: Duration = Duration::from_millis(3000);
const NOW_PLAYING_STATUS: Duration = Duration::from_millis(2000);
const SWITCHED_STATUS: Duration = Duration::from_millis(3000);
const PLAYBACK_ERROR_STATUS: Duration = Duration::from_millis(3000);
const NOTICE_STATUS: Duration = Duration::from_millis(5000);

pub const NO_VIDEOS_MESSAGE: &str = "No videos available - Please add videos to the videos directory";
pub const CATALOG_ERROR_MESSAGE: &str = "Error loading videos";
pub const AUTOPLAY_BLOCKED_MESSAGE: &str = "Click anywhere to start playback";

/// Timing and presentation knobs of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineSettings {
    /// Cross-fade overlap before the surfaces swap roles.
    pub settle_delay: Duration,
    /// Wait between an active-surface error and the transition it triggers.
    pub error_backoff: Duration,
    pub show_empty_placeholder: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            error_backoff: Duration::from_millis(1000),
            show_empty_placeholder: true,
        }
    }
}

/// Everything the engine loop reacts to, besides its own timers.
#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    Surface { slot: SurfaceSlot, kind: SurfaceEventKind },
    ConfigPolled(Configuration),
    /// Click, key press or touch on the kiosk; resumes blocked autoplay.
    UserInteraction,
    /// Display came back from a screensaver or blanking.
    VisibilityRestored,
}

/// Sending half of the engine channel. Cheap to clone.
#[derive(Clone, Debug)]
pub struct EngineEvents {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineEvents {
    pub fn reporter(&self, slot: SurfaceSlot) -> SurfaceReporter {
        SurfaceReporter::new(slot, self.tx.clone())
    }

    pub fn user_interaction(&self) {
        let _ = self.tx.send(EngineEvent::UserInteraction);
    }

    pub fn visibility_restored(&self) {
        let _ = self.tx.send(EngineEvent::VisibilityRestored);
    }

    /// Returns `false` once the engine has stopped listening.
    pub fn config_polled(&self, config: Configuration) -> bool {
        self.tx.send(EngineEvent::ConfigPolled(config)).is_ok()
    }
}

pub fn event_channel() -> (EngineEvents, mpsc::UnboundedReceiver<EngineEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EngineEvents { tx }, rx)
}

/// Both ends of the engine channel, kept together until the engine starts.
///
/// Surfaces take their reporters from [`EngineChannel::events`] before the
/// channel is handed to [`crate::start`].
#[derive(Debug)]
pub struct EngineChannel {
    events: EngineEvents,
    receiver: mpsc::UnboundedReceiver<EngineEvent>,
}

impl EngineChannel {
    pub fn new() -> Self {
        let (events, receiver) = event_channel();
        Self { events, receiver }
    }

    pub fn events(&self) -> &EngineEvents {
        &self.events
    }

    pub(crate) fn into_parts(self) -> (EngineEvents, mpsc::UnboundedReceiver<EngineEvent>) {
        (self.events, self.receiver)
    }
}

impl Default for EngineChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Fading {
        next_index: usize,
        settle_deadline: Instant,
        /// Set when the incoming surface failed to start or reported an error.
        incoming_error: Option<String>,
    },
}

#[derive(Clone, Copy, Debug)]
struct ErrorRetry {
    deadline: Instant,
    /// Session epoch of the clip that failed.
    epoch: u64,
}

pub struct PlaybackEngine {
    settings: EngineSettings,
    catalog: Vec<Clip>,
    config: Configuration,
    pair: SurfacePair,
    status: StatusReporter,
    active_index: usize,
    /// Catalog index the idle surface currently holds.
    idle_index: Option<usize>,
    phase: Phase,
    /// Bumped whenever the active clip changes.
    epoch: u64,
    error_retry: Option<ErrorRetry>,
    deferred_selection: Option<usize>,
    awaiting_interaction: Option<SurfaceSlot>,
    catalog_unavailable: bool,
}

impl PlaybackEngine {
    pub fn new(
        settings: EngineSettings,
        catalog: Vec<Clip>,
        config: Configuration,
        front: Box<dyn PlayableSurface>,
        back: Box<dyn PlayableSurface>,
        status_sink: Arc<dyn StatusSink>,
    ) -> Self {
        info!("Creating playback engine with {} clip(s), settle delay {:?}", catalog.len(), settings.settle_delay);
        Self {
            settings,
            catalog,
            config,
            pair: SurfacePair::new(front, back),
            status: StatusReporter::new(status_sink),
            active_index: 0,
            idle_index: None,
            phase: Phase::Idle,
            epoch: 0,
            error_retry: None,
            deferred_selection: None,
            awaiting_interaction: None,
            catalog_unavailable: false,
        }
    }

    /// The catalog could not be fetched, as opposed to being empty.
    pub fn mark_catalog_unavailable(&mut self) {
        self.catalog_unavailable = true;
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_fading(&self) -> bool {
        matches!(self.phase, Phase::Fading { .. })
    }

    /// `None` while the catalog is empty.
    pub fn active_index(&self) -> Option<usize> {
        (!self.catalog.is_empty()).then_some(self.active_index)
    }

    pub fn idle_index(&self) -> Option<usize> {
        self.idle_index
    }

    pub fn active_slot(&self) -> SurfaceSlot {
        self.pair.active_slot()
    }

    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn catalog(&self) -> &[Clip] {
        &self.catalog
    }

    /// Start the first clip and preload its successor.
    ///
    /// With an empty catalog this only shows the "no content" status (and the
    /// placeholder when enabled); the engine then stays inert.
    pub async fn start(&mut self) {
        if self.catalog.is_empty() {
            let message = if self.catalog_unavailable { CATALOG_ERROR_MESSAGE } else { NO_VIDEOS_MESSAGE };
            warn!("Nothing to play: {}", message);
            self.status.show(message, NOTICE_STATUS);
            if self.settings.show_empty_placeholder {
                self.status.show_placeholder(NO_VIDEOS_MESSAGE);
            }
            return;
        }

        self.active_index = self.config.selected_filename.as_deref()
            .and_then(|name| catalog_index(&self.catalog, name))
            .unwrap_or(0);
        info!("Starting playback at index {} ('{}')", self.active_index, self.catalog[self.active_index].filename);

        let active = self.pair.active_slot();
        let clip = self.catalog[self.active_index].clone();
        self.pair.assign(active, &clip, self.config.audio());
        self.pair.get_mut(active).set_presentation(Presentation::Visible);
        self.pair.idle_mut().set_presentation(Presentation::Hidden);

        self.status.show(&format!("Playing: {}", clip.filename), STARTUP_STATUS);
        self.play_active().await;
        self.preload_idle();
    }

    /// Drive the engine until every event sender is dropped.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<EngineEvent>) {
        info!("Playback engine loop running");
        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                _ = sleep_until_deadline(deadline) => {
                    self.on_timer(Instant::now()).await;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => {
                        info!("Engine event channel closed, stopping playback loop");
                        break;
                    }
                },
            }
        }
    }

    pub async fn handle_event(&mut self, event: EngineEvent) {
        trace!("Handling engine event: {:?}", event);
        match event {
            EngineEvent::Surface { slot, kind } => self.on_surface_event(slot, kind).await,
            EngineEvent::ConfigPolled(config) => self.reconcile(config).await,
            EngineEvent::UserInteraction => {
                if let Some(slot) = self.awaiting_interaction.take() {
                    info!("User interaction, retrying blocked playback on {:?}", slot);
                    if let Err(e) = self.pair.get_mut(slot).play().await {
                        error!("Play after user interaction failed: {}", e);
                    }
                }
            }
            EngineEvent::VisibilityRestored => {
                if self.catalog.is_empty() {
                    return;
                }
                debug!("Display visible again, resuming active surface");
                if let Err(e) = self.pair.active_mut().play().await {
                    warn!("Resume after visibility change failed: {}", e);
                }
            }
        }
    }

    /// Earliest pending timer: the settle deadline or the error backoff.
    pub fn next_deadline(&self) -> Option<Instant> {
        let settle = match &self.phase {
            Phase::Fading { settle_deadline, .. } => Some(*settle_deadline),
            Phase::Idle => None,
        };
        let retry = self.error_retry.map(|r| r.deadline);
        match (settle, retry) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire every timer due at `now`.
    pub async fn on_timer(&mut self, now: Instant) {
        let settle_due = matches!(&self.phase, Phase::Fading { settle_deadline, .. } if *settle_deadline <= now);
        if settle_due {
            self.complete_transition().await;
        }
        if let Some(retry) = self.error_retry {
            if retry.deadline <= now {
                self.error_retry = None;
                if retry.epoch == self.epoch {
                    self.begin_transition("playback error").await;
                } else {
                    debug!("Dropping stale error retry (epoch {} != {})", retry.epoch, self.epoch);
                }
            }
        }
    }

    async fn on_surface_event(&mut self, slot: SurfaceSlot, kind: SurfaceEventKind) {
        if self.catalog.is_empty() {
            return;
        }
        let is_active = slot == self.pair.active_slot();
        match kind {
            SurfaceEventKind::ReadyToPlayThrough => {
                if is_active {
                    trace!("Active surface {:?} ready to play through", slot);
                } else {
                    debug!("Next clip preloaded on {:?}", slot);
                }
            }
            SurfaceEventKind::Ended if is_active => {
                if self.catalog.len() == 1 {
                    debug!("Single clip ended, restarting it");
                    let clip = self.catalog[self.active_index].clone();
                    self.pair.assign(slot, &clip, self.config.audio());
                    self.play_active().await;
                } else {
                    self.begin_transition("clip ended").await;
                }
            }
            SurfaceEventKind::Error(message) if is_active => self.on_active_error(&message),
            SurfaceEventKind::Error(message) => {
                if let Phase::Fading { incoming_error, .. } = &mut self.phase {
                    warn!("Incoming surface {:?} failed during fade: {}", slot, message);
                    incoming_error.get_or_insert(message);
                } else {
                    warn!("Idle surface {:?} failed to preload: {}", slot, message);
                }
            }
            SurfaceEventKind::Ended => trace!("Ignoring end report from idle surface {:?}", slot),
        }
    }

    fn on_active_error(&mut self, message: &str) {
        let filename = self.catalog[self.active_index].filename.clone();
        error!("Playback error on '{}': {}", filename, message);
        self.status.show(&format!("Cannot play video: {}", filename), PLAYBACK_ERROR_STATUS);

        if self.catalog.len() < 2 {
            return;
        }
        if self.is_fading() {
            debug!("Error during fade ignored, transition already under way");
            return;
        }
        if self.error_retry.is_some() {
            return;
        }
        self.error_retry = Some(ErrorRetry {
            deadline: Instant::now() + self.settings.error_backoff,
            epoch: self.epoch,
        });
    }

    /// Start a cross-fade to the next clip. No-op unless `Idle` with 2+ clips.
    pub async fn begin_transition(&mut self, reason: &str) {
        if self.is_fading() {
            debug!("Transition trigger '{}' ignored while fading", reason);
            return;
        }
        if self.catalog.len() < 2 {
            return;
        }

        let next_index = resolver::next_index(&self.catalog, &self.config.playlists, &self.config.active_playlist, self.active_index);
        self.phase = Phase::Fading {
            next_index,
            settle_deadline: Instant::now() + self.settings.settle_delay,
            incoming_error: None,
        };
        self.error_retry = None;
        info!("Transitioning ({}) from {} to {}", reason, self.active_index, next_index);

        let incoming = self.pair.idle_slot();
        if self.idle_index != Some(next_index) {
            let clip = self.catalog[next_index].clone();
            self.pair.assign(incoming, &clip, self.config.audio());
            self.idle_index = Some(next_index);
        }
        self.pair.active_mut().set_presentation(Presentation::FadingOut);
        self.pair.get_mut(incoming).set_presentation(Presentation::FadingIn);

        if let Err(e) = self.play_slot(incoming).await {
            error!("Failed to play next clip: {}", e);
            if let (PlayError::Media(message), Phase::Fading { incoming_error, .. }) = (e, &mut self.phase) {
                incoming_error.get_or_insert(message);
            }
        }
    }

    /// Swap roles once the settle delay has elapsed.
    async fn complete_transition(&mut self) {
        let (next_index, incoming_error) = match &mut self.phase {
            Phase::Fading { next_index, incoming_error, .. } => (*next_index, incoming_error.take()),
            Phase::Idle => return,
        };

        let previous_index = self.active_index;
        self.pair.swap_roles();
        let outgoing = self.pair.idle_slot();
        {
            let surface = self.pair.get_mut(outgoing);
            surface.set_presentation(Presentation::Hidden);
            surface.pause();
            surface.seek_to_zero();
        }
        self.pair.active_mut().set_presentation(Presentation::Visible);
        if self.awaiting_interaction == Some(outgoing) {
            self.awaiting_interaction = None;
        }

        self.idle_index = Some(previous_index);
        self.active_index = next_index;
        self.epoch += 1;
        self.phase = Phase::Idle;
        debug!("Transition complete, active index {}", self.active_index);

        if let Some(selected) = self.deferred_selection.take() {
            if selected != self.active_index {
                self.forced_restart(selected).await;
                return;
            }
        }

        self.preload_idle();
        self.status.show(&format!("Now playing: {}", self.catalog[self.active_index].filename), NOW_PLAYING_STATUS);

        if let Some(message) = incoming_error {
            self.on_active_error(&message);
        }
    }

    /// Apply a polled configuration. The cache is replaced wholesale.
    pub async fn reconcile(&mut self, next: Configuration) {
        let deltas = reconcile::diff(&self.config, &next);
        if deltas.is_empty() {
            trace!("Configuration unchanged");
            return;
        }
        self.config = next;
        if self.catalog.is_empty() {
            debug!("Cached {} configuration change(s); nothing is playing", deltas.len());
            return;
        }

        for delta in deltas {
            match delta {
                ConfigDelta::VolumeChanged(volume) => {
                    info!("Volume updated to {}", volume);
                    self.pair.apply_audio(self.config.audio());
                }
                ConfigDelta::MutedChanged(muted) => {
                    info!("Mute updated to {}", muted);
                    self.pair.apply_audio(self.config.audio());
                }
                ConfigDelta::PlaylistsChanged => {
                    info!("Playlists updated, active playlist '{}'", self.config.active_playlist);
                    if !self.is_fading() {
                        self.preload_idle();
                    }
                }
                ConfigDelta::SelectionChanged(selected) => self.apply_selection(selected).await,
            }
        }
    }

    async fn apply_selection(&mut self, selected: Option<String>) {
        let Some(name) = selected else {
            debug!("Selection cleared");
            self.deferred_selection = None;
            return;
        };
        let Some(index) = catalog_index(&self.catalog, &name) else {
            warn!("Selected video '{}' is not in the catalog", name);
            self.deferred_selection = None;
            return;
        };

        let fading_to = match &self.phase {
            Phase::Fading { next_index, .. } => Some(*next_index),
            Phase::Idle => None,
        };
        match fading_to {
            Some(next_index) => {
                // Only the latest selection counts once the fade completes.
                self.deferred_selection = (index != next_index).then_some(index);
                if self.deferred_selection.is_some() {
                    info!("Selection '{}' deferred until the running fade completes", name);
                }
            }
            None if index != self.active_index => {
                info!("Video selection changed to {}", name);
                self.forced_restart(index).await;
            }
            None => debug!("Selected video '{}' is already playing", name),
        }
    }

    /// Jump straight to `index` on the active surface, skipping the fade.
    async fn forced_restart(&mut self, index: usize) {
        info!("Restarting playback at index {}", index);
        self.phase = Phase::Idle;
        self.error_retry = None;
        self.deferred_selection = None;
        self.epoch += 1;
        self.active_index = index;

        let active = self.pair.active_slot();
        {
            let idle = self.pair.idle_mut();
            idle.set_presentation(Presentation::Hidden);
            idle.pause();
        }
        if self.awaiting_interaction == Some(self.pair.idle_slot()) {
            self.awaiting_interaction = None;
        }
        let clip = self.catalog[index].clone();
        self.pair.assign(active, &clip, self.config.audio());
        self.pair.get_mut(active).set_presentation(Presentation::Visible);

        self.status.show(&format!("Switched to: {}", clip.filename), SWITCHED_STATUS);
        self.play_active().await;
        self.preload_idle();
    }

    /// Load the resolved following clip into the idle surface without playing it.
    fn preload_idle(&mut self) {
        if self.catalog.len() < 2 {
            self.idle_index = None;
            return;
        }
        let next = resolver::next_index(&self.catalog, &self.config.playlists, &self.config.active_playlist, self.active_index);
        if self.idle_index == Some(next) {
            trace!("Idle surface already holds index {}", next);
            return;
        }
        let idle = self.pair.idle_slot();
        let clip = self.catalog[next].clone();
        self.pair.get_mut(idle).pause();
        self.pair.assign(idle, &clip, self.config.audio());
        self.idle_index = Some(next);
        debug!("Preloaded '{}' (index {}) on {:?}", clip.filename, next, idle);
    }

    async fn play_active(&mut self) {
        let active = self.pair.active_slot();
        if let Err(PlayError::Media(message)) = self.play_slot(active).await {
            self.on_active_error(&message);
        }
    }

    async fn play_slot(&mut self, slot: SurfaceSlot) -> Result<(), PlayError> {
        let result = self.pair.get_mut(slot).play().await;
        if let Err(PlayError::AutoplayBlocked) = &result {
            info!("Autoplay blocked on {:?}, waiting for user interaction", slot);
            self.awaiting_interaction = Some(slot);
            self.status.show(AUTOPLAY_BLOCKED_MESSAGE, NOTICE_STATUS);
        }
        result
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_reporters_reach_its_own_receiver() {
        let channel = EngineChannel::new();
        let reporter = channel.events().reporter(SurfaceSlot::Back);
        channel.events().user_interaction();
        let (_events, mut receiver) = channel.into_parts();

        reporter.ended();
        assert_eq!(receiver.recv().await, Some(EngineEvent::UserInteraction));
        assert_eq!(receiver.recv().await, Some(EngineEvent::Surface {
            slot: SurfaceSlot::Back,
            kind: SurfaceEventKind::Ended,
        }));
    }
}
