// src/error.rs

//! Unified error handling for the reanalyzer.

use std::fmt;

use thiserror::Error;

/// Result type alias for reanalyzer operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Code attached by the analysis service when a module no longer exists upstream.
pub const CODE_NOT_FOUND: &str = "NOT_FOUND";

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

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// No analysis record stored for the module
    #[error("No analysis record for {name}")]
    RecordNotFound { name: String },

    /// Document store request failed
    #[error("Store error for {name}: {message}")]
    Store { name: String, message: String },

    /// Search index request failed
    #[error("Index error for {name}: {message}")]
    Index { name: String, message: String },

    /// Delivery queue operation failed
    #[error("Queue error: {0}")]
    Queue(String),

    /// Analysis service reported a failure
    #[error("Analysis of {name} failed: {message}")]
    Analysis {
        name: String,
        code: Option<String>,
        unrecoverable: bool,
        message: String,
    },

    /// Scoring service reported a failure
    #[error("Scoring of {name} failed: {message}")]
    Scoring { name: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a store error for a module.
    pub fn store(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Store {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Create an index error for a module.
    pub fn index(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Index {
            name: name.into(),
            message: message.to_string(),
        }
    }

    /// Create a queue error.
    pub fn queue(message: impl fmt::Display) -> Self {
        Self::Queue(message.to_string())
    }

    /// Create an untagged analysis error.
    pub fn analysis(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Analysis {
            name: name.into(),
            code: None,
            unrecoverable: false,
            message: message.to_string(),
        }
    }

    /// Create a scoring error.
    pub fn scoring(name: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Scoring {
            name: name.into(),
            message: message.to_string(),
        }
    }
}
