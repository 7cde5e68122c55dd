//! A surface with no display, for dry runs on a kiosk host.
//!
//! Each clip "plays" for a fixed duration and then reports that it ended.
//! Local file locators that do not exist fail the play attempt, so a broken
//! catalog shows up in the log the same way it would on screen.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::errors::PlayError;
use crate::surface::{PlayableSurface, Presentation, SurfaceReporter};

pub struct HeadlessSurface {
    reporter: SurfaceReporter,
    clip_duration: Duration,
    source: Option<String>,
    /// Playback time left in the current clip.
    remaining: Duration,
    started_at: Option<Instant>,
    timer: Option<JoinHandle<()>>,
    volume: f32,
    muted: bool,
}

impl HeadlessSurface {
    pub fn new(reporter: SurfaceReporter, clip_duration: Duration) -> Self {
        Self {
            reporter,
            clip_duration,
            source: None,
            remaining: clip_duration,
            started_at: None,
            timer: None,
            volume: 0.0,
            muted: true,
        }
    }

    /// Running and not yet past the end of the clip.
    pub fn is_playing(&self) -> bool {
        self.started_at.is_some_and(|started| started.elapsed() < self.remaining)
    }

    fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(started) = self.started_at.take() {
            self.remaining = self.remaining.saturating_sub(started.elapsed());
        }
    }

    fn start_timer(&mut self) {
        let reporter = self.reporter.clone();
        let remaining = self.remaining;
        self.started_at = Some(Instant::now());
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            reporter.ended();
        }));
    }
}

#[async_trait]
impl PlayableSurface for HeadlessSurface {
    fn set_source(&mut self, locator: &str) {
        self.stop_timer();
        self.source = Some(locator.to_string());
        self.remaining = self.clip_duration;
        debug!("{:?} loaded {}", self.reporter.slot(), locator);
        self.reporter.ready_to_play_through();
    }

    fn set_volume(&mut self, level: f32) {
        self.volume = level;
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    async fn play(&mut self) -> Result<(), PlayError> {
        let source = self.source.clone().ok_or_else(|| PlayError::Media("no source assigned".to_string()))?;
        let is_remote = source.starts_with("http://") || source.starts_with("https://");
        if !is_remote && !Path::new(&source).is_file() {
            return Err(PlayError::Media(format!("{} not found", source)));
        }
        if self.is_playing() {
            return Ok(());
        }
        self.stop_timer();
        if self.remaining.is_zero() {
            debug!("{:?} clip had ended, playing {} from the start", self.reporter.slot(), source);
            self.remaining = self.clip_duration;
        }
        info!("{:?} playing {} (volume {:.2}, muted {})", self.reporter.slot(), source, self.volume, self.muted);
        self.start_timer();
        Ok(())
    }

    fn pause(&mut self) {
        self.stop_timer();
    }

    fn seek_to_zero(&mut self) {
        let was_playing = self.is_playing();
        self.stop_timer();
        self.remaining = self.clip_duration;
        if was_playing {
            self.start_timer();
        }
    }

    fn set_presentation(&mut self, presentation: Presentation) {
        debug!("{:?} presentation -> {:?}", self.reporter.slot(), presentation);
    }
}

impl Drop for HeadlessSurface {
    fn drop(&mut self) {
        self.stop_timer();
    }
}
