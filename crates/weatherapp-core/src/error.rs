//! Centralized error types for the weather application.
//!
//! This module provides a typed error hierarchy that:
//! - Separates transport, parsing, cache, navigation and config failures
//! - Provides user-friendly messages suitable for terminal display
//! - Carries enough context (provider, page, URL, path) to tell sources apart

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a short message for the terminal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the terminal.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Parse(e) => e.user_message(),
            AppError::Cache(e) => e.user_message(),
            AppError::Navigation(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "Reading input or writing a file failed. Please try again.",
        }
    }
}

/// Network-related errors raised by the fetcher.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection to {url} failed: {message}")]
    ConnectionFailed { url: String, message: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Server answered {status} for {url}")]
    ServerError { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {message}")]
    Body { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout { .. } => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather site is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The weather site rejected the request.",
            NetworkError::Body { .. } => "Received an incomplete page. Please try again.",
            NetworkError::Client(_) => "Failed to set up networking.",
        }
    }
}

/// Kind of page an extraction ran against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Current,
    Hourly,
    NextDay,
    /// Location listing at the given hierarchy level.
    Locations(usize),
}

impl fmt::Display for PageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageKind::Current => f.write_str("current"),
            PageKind::Hourly => f.write_str("hourly"),
            PageKind::NextDay => f.write_str("next-day"),
            PageKind::Locations(level) => write!(f, "locations (level {level})"),
        }
    }
}

/// An expected structural landmark was missing from a fetched page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{provider}: '{landmark}' not found on {page} page")]
pub struct ParseError {
    pub provider: String,
    pub page: PageKind,
    pub landmark: String,
}

impl ParseError {
    pub fn new(provider: impl Into<String>, page: PageKind, landmark: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            page,
            landmark: landmark.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        "The weather page layout changed or the page is incomplete."
    }
}

/// Cache directory or file could not be read or written.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read cache file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write cache file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub fn user_message(&self) -> &'static str {
        match self {
            CacheError::CreateDir { .. } => {
                "Unable to create the cache directory. Check permissions."
            }
            CacheError::Read { .. } => "Unable to read the page cache. Check permissions.",
            CacheError::Write { .. } => "Unable to write the page cache. Check permissions.",
            CacheError::Remove { .. } => "Unable to remove cache files. Check permissions.",
        }
    }
}

/// Location browsing failures. All of them end the browsing session.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("'{choice}' is not a known {level_label}")]
    UnknownChoice { level_label: String, choice: String },

    #[error("No {level_label} entries found at {url}")]
    EmptyLevel { level_label: String, url: String },

    #[error("Level {level} is outside the hierarchy (depth {depth})")]
    LevelOutOfRange { level: usize, depth: usize },

    #[error("Failed to read selection: {0}")]
    Input(#[source] std::io::Error),
}

impl NavigationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NavigationError::UnknownChoice { .. } => {
                "Wrong name entered. Please restart location setup and try again."
            }
            NavigationError::EmptyLevel { .. } => "The location list is empty.",
            NavigationError::LevelOutOfRange { .. } => "Invalid location level.",
            NavigationError::Input(_) => "Could not read your answer.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => {
                "Config file is broken. Delete it to reconfigure to defaults."
            }
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
            ConfigError::UnknownProvider(_) => "No such provider.",
        }
    }
}

/// Operation in progress when a provider failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Current,
    Hourly,
    NextDay,
    BrowseLocation,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Current => "current weather",
            Operation::Hourly => "hourly forecast",
            Operation::NextDay => "next-day forecast",
            Operation::BrowseLocation => "location browsing",
        })
    }
}

/// An error tagged with the provider and operation that produced it.
#[derive(Debug, Error)]
#[error("{provider}: {operation} failed: {source}")]
pub struct ProviderFailure {
    pub provider: String,
    pub operation: Operation,
    #[source]
    pub source: AppError,
}

impl ProviderFailure {
    pub fn new(
        provider: impl Into<String>,
        operation: Operation,
        source: impl Into<AppError>,
    ) -> Self {
        Self {
            provider: provider.into(),
            operation,
            source: source.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        self.source.user_message()
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self, url: &str) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self, url: &str) -> NetworkError {
        let url = url.to_string();
        if self.is_timeout() {
            NetworkError::Timeout { url }
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                url,
                status: status.as_u16(),
            }
        } else if self.is_body() || self.is_decode() {
            NetworkError::Body {
                url,
                message: self.to_string(),
            }
        } else if self.is_builder() {
            NetworkError::Client(self.to_string())
        } else {
            NetworkError::ConnectionFailed {
                url,
                message: self.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_provider_page_and_landmark() {
        let err = ParseError::new("RP5", PageKind::Hourly, "table#forecastTable_1");
        let text = err.to_string();
        assert!(text.contains("RP5"));
        assert!(text.contains("hourly"));
        assert!(text.contains("table#forecastTable_1"));
    }

    #[test]
    fn test_app_error_conversion() {
        let nav = NavigationError::UnknownChoice {
            level_label: "city".into(),
            choice: "Atlantis".into(),
        };
        let app_err: AppError = nav.into();
        assert!(matches!(
            app_err,
            AppError::Navigation(NavigationError::UnknownChoice { .. })
        ));
    }

    #[test]
    fn test_user_message_propagation() {
        let app_err = AppError::Network(NetworkError::Timeout {
            url: "https://example.com".into(),
        });
        assert_eq!(
            app_err.user_message(),
            "The request timed out. Please try again."
        );
    }

    #[test]
    fn test_server_error_message_depends_on_status() {
        let upstream = NetworkError::ServerError {
            url: "u".into(),
            status: 503,
        };
        let rejected = NetworkError::ServerError {
            url: "u".into(),
            status: 403,
        };
        assert_ne!(upstream.user_message(), rejected.user_message());
    }

    #[test]
    fn test_provider_failure_names_provider_and_operation() {
        let failure = ProviderFailure::new(
            "Sinoptik",
            Operation::Hourly,
            ParseError::new("Sinoptik", PageKind::Hourly, "tr.temperature"),
        );
        let text = failure.to_string();
        assert!(text.starts_with("Sinoptik: hourly forecast failed"));
        assert!(text.contains("tr.temperature"));
    }

    #[test]
    fn test_page_kind_display() {
        assert_eq!(PageKind::NextDay.to_string(), "next-day");
        assert_eq!(PageKind::Locations(2).to_string(), "locations (level 2)");
    }
}
