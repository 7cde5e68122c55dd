//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kiosk_player::{
    Clip, Configuration, EngineSettings, PlayError, PlayableSurface, PlaybackEngine, Presentation, StatusSink,
    SurfaceSlot,
};

#[derive(Debug)]
pub struct SurfaceState {
    pub source: Option<String>,
    pub volume: f32,
    pub muted: bool,
    pub playing: bool,
    pub at_zero: bool,
    pub presentation: Presentation,
    pub play_calls: usize,
    /// Results handed out by successive `play()` calls; `Ok` once drained.
    pub play_results: VecDeque<Result<(), PlayError>>,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            source: None,
            volume: 0.0,
            muted: false,
            playing: false,
            at_zero: true,
            presentation: Presentation::Hidden,
            play_calls: 0,
            play_results: VecDeque::new(),
        }
    }
}

/// Surface that records every call into shared state the test can inspect.
pub struct RecordingSurface {
    state: Arc<Mutex<SurfaceState>>,
}

#[async_trait]
impl PlayableSurface for RecordingSurface {
    fn set_source(&mut self, locator: &str) {
        let mut state = self.state.lock().unwrap();
        state.source = Some(locator.to_string());
        state.playing = false;
        state.at_zero = true;
    }

    fn set_volume(&mut self, level: f32) {
        self.state.lock().unwrap().volume = level;
    }

    fn set_muted(&mut self, muted: bool) {
        self.state.lock().unwrap().muted = muted;
    }

    async fn play(&mut self) -> Result<(), PlayError> {
        let mut state = self.state.lock().unwrap();
        state.play_calls += 1;
        let result = state.play_results.pop_front().unwrap_or(Ok(()));
        if result.is_ok() {
            state.playing = true;
            state.at_zero = false;
        }
        result
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().playing = false;
    }

    fn seek_to_zero(&mut self) {
        self.state.lock().unwrap().at_zero = true;
    }

    fn set_presentation(&mut self, presentation: Presentation) {
        self.state.lock().unwrap().presentation = presentation;
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub shown: Mutex<Vec<String>>,
    pub placeholders: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn last_shown(&self) -> Option<String> {
        self.shown.lock().unwrap().last().cloned()
    }
}

impl StatusSink for RecordingSink {
    fn show(&self, message: &str) {
        self.shown.lock().unwrap().push(message.to_string());
    }

    fn hide(&self) {}

    fn show_placeholder(&self, message: &str) {
        self.placeholders.lock().unwrap().push(message.to_string());
    }
}

pub struct Harness {
    pub engine: PlaybackEngine,
    pub front: Arc<Mutex<SurfaceState>>,
    pub back: Arc<Mutex<SurfaceState>>,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn surface(&self, slot: SurfaceSlot) -> std::sync::MutexGuard<'_, SurfaceState> {
        match slot {
            SurfaceSlot::Front => self.front.lock().unwrap(),
            SurfaceSlot::Back => self.back.lock().unwrap(),
        }
    }

    pub fn active(&self) -> std::sync::MutexGuard<'_, SurfaceState> {
        self.surface(self.engine.active_slot())
    }

    pub fn idle(&self) -> std::sync::MutexGuard<'_, SurfaceState> {
        self.surface(self.engine.active_slot().other())
    }

    /// Filename of the clip the engine considers active.
    pub fn active_filename(&self) -> String {
        let index = self.engine.active_index().expect("catalog is empty");
        self.engine.catalog()[index].filename.clone()
    }
}

pub fn locator(name: &str) -> String {
    format!("/videos/{}", name)
}

pub fn catalog(names: &[&str]) -> Vec<Clip> {
    names.iter()
        .map(|n| Clip { filename: n.to_string(), locator: locator(n) })
        .collect()
}

pub fn harness(names: &[&str], config: Configuration) -> Harness {
    harness_with(names, config, EngineSettings::default())
}

pub fn harness_with(names: &[&str], config: Configuration, settings: EngineSettings) -> Harness {
    let front = Arc::new(Mutex::new(SurfaceState::default()));
    let back = Arc::new(Mutex::new(SurfaceState::default()));
    let sink = Arc::new(RecordingSink::default());
    let engine = PlaybackEngine::new(
        settings,
        catalog(names),
        config,
        Box::new(RecordingSurface { state: front.clone() }),
        Box::new(RecordingSurface { state: back.clone() }),
        sink.clone(),
    );
    Harness { engine, front, back, sink }
}
