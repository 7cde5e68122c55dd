//! Client-side playback engine for an unattended looping video kiosk.
//!
//! The backend owns the configuration (volume, mute, selected video,
//! playlists) and the video catalog; this crate plays the catalog on two
//! alternating surfaces with cross-fades and follows configuration changes by
//! polling. [`start`] is the entry point a display shell calls with its two
//! surfaces and a status sink.

pub mod backend_client;
pub mod config;
pub mod engine;
pub mod errors;
pub mod headless;
pub mod model;
pub mod reconcile;
pub mod resolver;
pub mod status;
pub mod surface;

use std::sync::Arc;

use log::{error, info};

pub use config::{AppConfig, LocatorMode};
pub use engine::{event_channel, EngineChannel, EngineEvent, EngineEvents, EngineSettings, PlaybackEngine, Phase};
pub use errors::{AppError, BackendError, ConfigError, PlayError};
pub use model::{AudioLevel, Clip, Configuration};
pub use status::{StatusSink, LogStatusSink};
pub use surface::{PlayableSurface, Presentation, SurfaceEventKind, SurfaceReporter, SurfaceSlot};

/// Fetch the initial state, start playback and run until the event channel closes.
///
/// Surfaces report through reporters taken from `channel` before this call.
/// Backend failures at startup fall back to the default configuration and an
/// empty catalog, so the only error returned is failing to build the HTTP
/// client.
pub async fn start(
    app_config: AppConfig,
    front: Box<dyn PlayableSurface>,
    back: Box<dyn PlayableSurface>,
    status_sink: Arc<dyn StatusSink>,
    channel: EngineChannel,
) -> Result<(), AppError> {
    let (events, receiver) = channel.into_parts();
    info!("Starting kiosk player against {}", app_config.backend_url);
    let client = backend_client::build_client()?;

    let initial = match backend_client::fetch_configuration(&app_config, &client).await {
        Ok(configuration) => configuration,
        Err(e) => {
            error!("Failed to load state, using defaults: {}", e);
            Configuration::default()
        }
    };
    let (catalog, catalog_loaded) = match backend_client::fetch_catalog(&app_config, &client).await {
        Ok(catalog) => (catalog, true),
        Err(e) => {
            error!("Failed to load videos: {}", e);
            (Vec::new(), false)
        }
    };

    let mut engine = PlaybackEngine::new(app_config.engine_settings(), catalog, initial, front, back, status_sink);
    if !catalog_loaded {
        engine.mark_catalog_unavailable();
    }

    let poller = tokio::spawn(backend_client::poll_configuration(app_config, client, events));
    engine.start().await;
    engine.run(receiver).await;
    poller.abort();
    Ok(())
}
