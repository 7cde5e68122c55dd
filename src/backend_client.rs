//! Handles all interactions with the kiosk backend.
//!
//! This module fetches the configuration snapshot (`/api/state`) and the video
//! catalog (`/api/videos`), turns catalog filenames into surface locators, and
//! runs the polling task that feeds fresh configuration to the engine. All
//! requests go through one `reqwest` client and report `BackendError`.

use log::{debug, error, info, trace, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::time::{Instant, MissedTickBehavior};
use url::Url;

use super::config::{AppConfig, LocatorMode};
use super::engine::EngineEvents;
use super::errors::BackendError;
use super::model::{Clip, Configuration, StateResponse, VideosResponse};

const STATE_PATH: &str = "/api/state";
const VIDEOS_PATH: &str = "/api/videos";
const VIDEO_ROUTE: &str = "videos";

/// Builds the HTTP client shared by startup fetches and the poller.
#[must_use = "building the HTTP client can fail; the Result must be handled"]
pub fn build_client() -> Result<Client, BackendError> {
    Client::builder()
        .user_agent(concat!("kiosk_player/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(BackendError::Reqwest)
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, BackendError> {
    trace!("GET {}", url);
    let response = client.get(url).send().await.map_err(|e| {
        error!("Request error fetching {}: {}", url, e);
        BackendError::Reqwest(e)
    })?;
    let response = response.error_for_status().map_err(|e| {
        let status = e.status().unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR);
        error!("HTTP error fetching {}: {} - {}", url, status, e);
        BackendError::HttpError { status, message: e.to_string() }
    })?;
    let body = response.text().await.map_err(BackendError::Reqwest)?;
    serde_json::from_str(&body).map_err(|e| {
        error!("Failed to parse response from {}: {}", url, e);
        BackendError::SerdeJson(e)
    })
}

/// Fetches the current configuration snapshot.
#[must_use = "fetching the configuration can fail; the Result must be handled"]
pub async fn fetch_configuration(config: &AppConfig, client: &Client) -> Result<Configuration, BackendError> {
    let url = format!("{}{}", config.backend_url, STATE_PATH);
    let state: StateResponse = get_json(client, &url).await?;
    let configuration = Configuration::from(state);
    debug!("Fetched configuration: {:?}", configuration);
    Ok(configuration)
}

/// Fetches the video catalog and resolves a locator for every entry.
///
/// Entries whose locator cannot be built are skipped with a warning.
#[must_use = "fetching the catalog can fail; the Result must be handled"]
pub async fn fetch_catalog(config: &AppConfig, client: &Client) -> Result<Vec<Clip>, BackendError> {
    let url = format!("{}{}", config.backend_url, VIDEOS_PATH);
    let listing: VideosResponse = get_json(client, &url).await?;

    let catalog: Vec<Clip> = listing.videos.into_iter()
        .filter_map(|entry| match resolve_locator(config, &entry.filename) {
            Ok(locator) => Some(Clip { filename: entry.filename, locator }),
            Err(e) => {
                warn!("Skipping catalog entry '{}': {}", entry.filename, e);
                None
            }
        })
        .collect();
    info!("Loaded {} videos", catalog.len());
    Ok(catalog)
}

/// Turns a catalog filename into the locator a surface opens.
pub fn resolve_locator(config: &AppConfig, filename: &str) -> Result<String, BackendError> {
    match &config.locator_mode {
        LocatorMode::Http => {
            let mut url = Url::parse(&config.backend_url)?;
            url.path_segments_mut()
                .map_err(|_| BackendError::UrlParse(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
                .pop_if_empty()
                .push(VIDEO_ROUTE)
                .push(filename);
            Ok(url.to_string())
        }
        LocatorMode::File { videos_dir } => {
            if filename.is_empty() || filename.contains(['/', '\\']) || filename == ".." || filename == "." {
                return Err(BackendError::InvalidFilename(filename.to_string()));
            }
            Ok(videos_dir.join(filename).to_string_lossy().into_owned())
        }
    }
}

/// Polls `/api/state` every `poll_interval` and hands snapshots to the engine.
///
/// A failed poll is logged and skipped; the engine keeps its cached copy. The
/// task ends when the engine stops listening.
pub async fn poll_configuration(config: AppConfig, client: Client, events: EngineEvents) {
    let mut ticker = tokio::time::interval_at(Instant::now() + config.poll_interval, config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Starting configuration polling every {:?} against {}", config.poll_interval, config.backend_url);

    loop {
        ticker.tick().await;
        match fetch_configuration(&config, &client).await {
            Ok(configuration) => {
                if !events.config_polled(configuration) {
                    info!("Playback engine stopped, ending configuration polling");
                    break;
                }
            }
            Err(e) => warn!("Failed to poll state, keeping cached configuration: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn http_locator_encodes_filename() {
        let config = AppConfig::new("http://kiosk.local:8080/");
        let locator = resolve_locator(&config, "camp fire #2.mp4").unwrap();
        assert_eq!(locator, "http://kiosk.local:8080/videos/camp%20fire%20%232.mp4");
    }

    #[test]
    fn file_locator_joins_videos_dir() {
        let mut config = AppConfig::new("http://kiosk.local");
        config.locator_mode = LocatorMode::File { videos_dir: PathBuf::from("/opt/fireplace/videos") };
        assert_eq!(resolve_locator(&config, "fire.mp4").unwrap(), "/opt/fireplace/videos/fire.mp4");
    }

    #[test]
    fn file_locator_rejects_path_traversal() {
        let mut config = AppConfig::new("http://kiosk.local");
        config.locator_mode = LocatorMode::File { videos_dir: PathBuf::from("/opt/fireplace/videos") };
        assert!(resolve_locator(&config, "../etc/passwd").is_err());
        assert!(resolve_locator(&config, "..").is_err());
    }
}
