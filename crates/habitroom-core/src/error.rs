//! Core error types for habitroom-core.
//!
//! Validation failures carry the corrective message shown to the admin;
//! transport failures are caught by the service and only logged.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for habitroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file exists but could not be read
    #[error("Failed to read configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory {path}: {message}")]
    DataDir { path: PathBuf, message: String },
}

/// Validation errors for habit definitions and admin commands.
///
/// The `Display` text is sent back to the admin verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid id '{0}': use 2-32 characters from a-z, 0-9 and _")]
    InvalidId(String),

    #[error("Invalid name '{0}': must be 2-60 characters")]
    InvalidName(String),

    #[error("Invalid {field} time '{value}': expected HH:MM")]
    InvalidTime { field: &'static str, value: String },

    #[error("Times must satisfy start < end <= fallback end (got {start} {end} {fallback_end})")]
    InvalidOrder {
        start: String,
        end: String,
        fallback_end: String,
    },

    #[error("Points must be non-negative integers (got '{0}')")]
    InvalidPoints(String),

    #[error("Habit '{0}' already exists")]
    DuplicateId(String),

    #[error("No habit with id '{0}'")]
    UnknownId(String),

    #[error("Usage: {0}")]
    Usage(&'static str),
}

/// Chat transport errors. Never fatal: the service logs and moves on.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Request could not be sent or the response could not be read
    #[error("transport failure: {0}")]
    Transport(String),

    /// The chat API answered with `ok: false`
    #[error("{method} rejected: {description}")]
    Api { method: String, description: String },

    /// The chat API answered with an unexpected payload
    #[error("unexpected response from {method}: {message}")]
    Decode { method: String, message: String },
}

/// Timer registration errors.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expr}': {message}")]
    InvalidExpression { expr: String, message: String },

    #[error("No upcoming occurrence for '{0}'")]
    NoOccurrence(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
