// src/error.rs

//! Unified error handling for the watcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Page could not be retrieved
    #[error("Fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    /// Page body could not be turned into a fingerprint
    #[error("Parse failed for {url}: {message}")]
    Parse { url: String, message: String },

    /// State file could not be written
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Alert could not be delivered
    #[error("Notification error: {0}")]
    Notification(String),

    /// Startup initialization pass failed
    #[error("Initialization error: {0}")]
    Init(String),

    /// A cycle aborted before completing
    #[error("Cycle aborted: {0}")]
    Cycle(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for a target.
    pub fn fetch(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error for a target.
    pub fn parse(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Parse {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a persistence error.
    pub fn persistence(message: impl fmt::Display) -> Self {
        Self::Persistence(message.to_string())
    }

    /// Create a notification error.
    pub fn notification(message: impl fmt::Display) -> Self {
        Self::Notification(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Short stable label used in logs and status output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } | Self::Http(_) => "fetch",
            Self::Parse { .. } => "parse",
            Self::Persistence(_) | Self::Io(_) | Self::Json(_) => "persistence",
            Self::Notification(_) => "notification",
            Self::Init(_) => "init",
            Self::Cycle(_) => "cycle",
            Self::Config(_) | Self::Toml(_) | Self::Url(_) | Self::Validation(_) => "config",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(AppError::fetch("https://a", "timeout").kind(), "fetch");
        assert_eq!(AppError::notification("403").kind(), "notification");
        assert_eq!(AppError::persistence("disk full").kind(), "persistence");
        assert_eq!(AppError::validation("empty").kind(), "config");
    }

    #[test]
    fn test_fetch_display() {
        let err = AppError::fetch("https://example.com", "status 503");
        assert_eq!(
            err.to_string(),
            "Fetch failed for https://example.com: status 503"
        );
    }
}
