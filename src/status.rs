//! Transient on-screen status messages.
//!
//! `StatusReporter` owns the auto-hide timer; the display layer only has to
//! implement `StatusSink`. A new message replaces the pending one and restarts
//! its timer.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::task::JoinHandle;

/// Where status text ends up. Implementations must not block or panic.
pub trait StatusSink: Send + Sync {
    fn show(&self, message: &str);
    fn hide(&self);
    /// Persistent placeholder for when there is nothing to play.
    fn show_placeholder(&self, message: &str);
}

/// Sink that writes status lines to the log, for headless runs.
#[derive(Debug, Default)]
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn show(&self, message: &str) {
        info!("[status] {}", message);
    }

    fn hide(&self) {
        debug!("[status] hidden");
    }

    fn show_placeholder(&self, message: &str) {
        info!("[placeholder] {}", message);
    }
}

pub struct StatusReporter {
    sink: Arc<dyn StatusSink>,
    pending_hide: Option<JoinHandle<()>>,
}

impl StatusReporter {
    pub fn new(sink: Arc<dyn StatusSink>) -> Self {
        Self { sink, pending_hide: None }
    }

    /// Show `message` and hide it after `duration`, last write wins.
    pub fn show(&mut self, message: &str, duration: Duration) {
        if let Some(handle) = self.pending_hide.take() {
            handle.abort();
        }
        self.sink.show(message);
        let sink = self.sink.clone();
        self.pending_hide = Some(tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            sink.hide();
        }));
    }

    pub fn show_placeholder(&mut self, message: &str) {
        self.sink.show_placeholder(message);
    }
}

impl Drop for StatusReporter {
    fn drop(&mut self) {
        if let Some(handle) = self.pending_hide.take() {
            handle.abort();
        }
    }
}
