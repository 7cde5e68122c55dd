//! Defines the custom error types used throughout the `kiosk_player` crate.
//!
//! Each category of failure (local configuration, backend fetches, surface
//! playback) has its own enum, and `AppError` wraps the ones that can stop
//! the binary at startup.
//! Every type implements `Debug`, `Display` and `std::error::Error`, with
//! `From` conversions for the underlying library errors.

use std::error::Error as StdError;
use std::fmt;

// --- ConfigError ---
/// Errors related to loading the local INI configuration.
#[must_use = "a configuration error should be handled or propagated"]
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io(std::io::Error),
    /// The configuration file content could not be parsed.
    Parse(String),
    /// A required key was missing from the `[settings]` section.
    MissingKey(String),
    /// A key was present but its value is unusable.
    Invalid { key: String, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Configuration I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Configuration parse error: {}", e),
            ConfigError::MissingKey(key) => write!(f, "Missing configuration key: '{}'", key),
            ConfigError::Invalid { key, message } => write!(f, "Invalid value for configuration key '{}': {}", key, message),
        }
    }
}

impl StdError for ConfigError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

// --- BackendError ---
/// Errors related to fetching state and the video catalog from the backend.
#[must_use = "a backend error should be handled or propagated"]
#[derive(Debug)]
pub enum BackendError {
    /// An error occurred during an HTTP request made by `reqwest`.
    Reqwest(reqwest::Error),
    /// The response body was not the JSON shape we expect.
    SerdeJson(serde_json::Error),
    /// The backend URL (or a locator derived from it) could not be parsed.
    UrlParse(url::ParseError),
    /// The backend answered with a non-success HTTP status.
    HttpError { status: reqwest::StatusCode, message: String },
    /// A catalog filename that cannot be mapped to a local path safely.
    InvalidFilename(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Reqwest(e) => write!(f, "Backend request error: {}", e),
            BackendError::SerdeJson(e) => write!(f, "Backend JSON (de)serialization error: {}", e),
            BackendError::UrlParse(e) => write!(f, "Backend URL parse error: {}", e),
            BackendError::HttpError { status, message } => write!(f, "Backend HTTP error {}: {}", status, message),
            BackendError::InvalidFilename(name) => write!(f, "Invalid video filename: '{}'", name),
        }
    }
}

impl StdError for BackendError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BackendError::Reqwest(e) => Some(e),
            BackendError::SerdeJson(e) => Some(e),
            BackendError::UrlParse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError::Reqwest(err)
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::SerdeJson(err)
    }
}

impl From<url::ParseError> for BackendError {
    fn from(err: url::ParseError) -> Self {
        BackendError::UrlParse(err)
    }
}

// --- PlayError ---
/// Reasons a surface can refuse or fail a play attempt.
#[must_use = "a play error decides between waiting for input and moving on"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayError {
    /// The platform blocked unattended playback; retry after user input.
    AutoplayBlocked,
    /// The surface could not decode or render its source.
    Media(String),
}

impl fmt::Display for PlayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayError::AutoplayBlocked => write!(f, "Autoplay blocked by the platform"),
            PlayError::Media(s) => write!(f, "Media playback error: {}", s),
        }
    }
}

impl StdError for PlayError {}

// --- AppError (Top-level error enum) ---
/// A top-level error type that can encompass any error within the application.
#[must_use = "an application error should be handled or propagated"]
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Backend(BackendError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Application Configuration Error: {}", e),
            AppError::Backend(e) => write!(f, "Application Backend Error: {}", e),
        }
    }
}

impl StdError for AppError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::Backend(e) => Some(e),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self { AppError::Config(err) }
}
impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self { AppError::Backend(err) }
}
