//! Handles application configuration loading and management.
//!
//! `AppConfig` holds the backend location, how video locators are built, and
//! the timing constants of the playback engine. `load_config` reads them from
//! the `[settings]` section of an INI file; everything but `backend_url` has a
//! default.

use std::path::PathBuf;
use std::time::Duration;

use configparser::ini::Ini;
use log::{debug, error, info};

use super::engine::EngineSettings;
use super::errors::ConfigError;

/// Config file used when `KIOSK_PLAYER_CONF` is not set.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/kiosk_player.conf";
pub const CONFIG_PATH_ENV: &str = "KIOSK_PLAYER_CONF";

const DEFAULT_VIDEOS_DIR: &str = "/opt/fireplace/videos";
const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;
const DEFAULT_SETTLE_DELAY_MS: u64 = 1000;
const DEFAULT_ERROR_BACKOFF_MS: u64 = 1000;
const DEFAULT_HEADLESS_CLIP_SECS: u64 = 30;

/// How a catalog filename becomes something a surface can open.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LocatorMode {
    /// Videos are streamed from `<backend_url>/videos/<filename>`.
    Http,
    /// Videos are opened straight from a local directory.
    File { videos_dir: PathBuf },
}

/// Holds the application's configuration parameters.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend_url: String,
    pub locator_mode: LocatorMode,
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub error_backoff: Duration,
    /// Render the "add videos here" placeholder when the catalog is empty.
    pub show_empty_placeholder: bool,
    /// Simulated clip length for the headless surfaces of the binary.
    pub headless_clip_duration: Duration,
}

impl AppConfig {
    /// Configuration with every optional setting at its default.
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
            locator_mode: LocatorMode::Http,
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
            error_backoff: Duration::from_millis(DEFAULT_ERROR_BACKOFF_MS),
            show_empty_placeholder: true,
            headless_clip_duration: Duration::from_secs(DEFAULT_HEADLESS_CLIP_SECS),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            settle_delay: self.settle_delay,
            error_backoff: self.error_backoff,
            show_empty_placeholder: self.show_empty_placeholder,
        }
    }
}

/// Path of the configuration file, honouring `KIOSK_PLAYER_CONF`.
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

/// Loads application configuration from the specified INI file path.
///
/// Reads settings from the `[settings]` section of the INI file.
///
/// # Errors
/// Returns `ConfigError` if the file cannot be read, is malformed, lacks
/// `backend_url`, or carries a value of the wrong type.
#[must_use = "loading configuration can fail, the Result must be handled"]
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Attempting to load config from: {}", path);
    if !std::path::Path::new(path).is_file() {
        error!("Config file '{}' does not exist", path);
        return Err(ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("config file '{}' not found", path),
        )));
    }

    let mut config_parser = Ini::new();
    config_parser.load(path).map_err(|e| {
        error!("Error loading config file '{}': {}", path, e);
        ConfigError::Parse(e)
    })?;

    let backend_url = config_parser.get("settings", "backend_url")
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            error!("Missing configuration key 'backend_url' in section '[settings]' of file '{}'", path);
            ConfigError::MissingKey("backend_url".to_string())
        })?;
    debug!("Loaded config value for key 'backend_url': {}", backend_url);
    if !backend_url.starts_with("http://") && !backend_url.starts_with("https://") {
        return Err(ConfigError::Invalid {
            key: "backend_url".to_string(),
            message: format!("'{}' must start with http:// or https://", backend_url),
        });
    }

    let mut app_config = AppConfig::new(backend_url);

    let get_millis = |key: &str, default: u64| -> Result<Duration, ConfigError> {
        let value = config_parser.getuint("settings", key)
            .map_err(|message| ConfigError::Invalid { key: key.to_string(), message })?
            .unwrap_or(default);
        debug!("Loaded config value for key '{}': {}", key, value);
        Ok(Duration::from_millis(value))
    };
    app_config.poll_interval = get_millis("poll_interval_ms", DEFAULT_POLL_INTERVAL_MS)?;
    app_config.settle_delay = get_millis("settle_delay_ms", DEFAULT_SETTLE_DELAY_MS)?;
    app_config.error_backoff = get_millis("error_backoff_ms", DEFAULT_ERROR_BACKOFF_MS)?;
    let clip_secs = config_parser.getuint("settings", "headless_clip_secs")
        .map_err(|message| ConfigError::Invalid { key: "headless_clip_secs".to_string(), message })?
        .unwrap_or(DEFAULT_HEADLESS_CLIP_SECS);
    app_config.headless_clip_duration = Duration::from_secs(clip_secs);

    if app_config.poll_interval.is_zero() {
        return Err(ConfigError::Invalid {
            key: "poll_interval_ms".to_string(),
            message: "must be greater than zero".to_string(),
        });
    }

    app_config.show_empty_placeholder = config_parser.getboolcoerce("settings", "show_empty_placeholder")
        .map_err(|message| ConfigError::Invalid { key: "show_empty_placeholder".to_string(), message })?
        .unwrap_or(true);

    let mode = config_parser.get("settings", "locator_mode").unwrap_or_else(|| "http".to_string());
    app_config.locator_mode = match mode.trim().to_lowercase().as_str() {
        "http" => LocatorMode::Http,
        "file" => {
            let videos_dir = config_parser.get("settings", "videos_dir")
                .unwrap_or_else(|| DEFAULT_VIDEOS_DIR.to_string());
            debug!("Loaded config value for key 'videos_dir': {}", videos_dir);
            LocatorMode::File { videos_dir: PathBuf::from(videos_dir) }
        }
        other => {
            error!("Unknown locator_mode '{}' in file '{}'", other, path);
            return Err(ConfigError::Invalid {
                key: "locator_mode".to_string(),
                message: format!("expected 'http' or 'file', got '{}'", other),
            });
        }
    };

    info!("Configuration loaded successfully from {}: {:?}", path, app_config);
    Ok(app_config)
}
