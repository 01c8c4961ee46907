//! Core error types for orthoptic-core.
//!
//! One top-level error with thiserror, fanned out into domain-specific
//! enums. A missing or malformed session record is deliberately NOT an
//! error anywhere in this hierarchy -- callers treat it as "logged out."

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for orthoptic-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Authentication / token lifecycle errors
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Errors talking to the backend (identity, document store, push)
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Local storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// User-input validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Authentication-specific errors.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No usable session; the caller must route to login.
    #[error("login required")]
    LoginRequired,

    /// The identity provider rejected the refresh token.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// Provider-defined rejection (e.g. EMAIL_EXISTS, INVALID_PASSWORD).
    #[error("{0}")]
    Provider(String),
}

/// Errors from backend collaborators.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transport-level failure. The transport's own timeout bounds the wait.
    #[error("network unavailable: {0}")]
    Network(#[from] reqwest::Error),

    /// A write to the per-user document did not land.
    #[error("remote write to '{doc}' failed: {message}")]
    WriteFailed { doc: String, message: String },

    /// The push service refused or did not acknowledge a delivery.
    #[error("reminder delivery failed: {0}")]
    DeliveryFailed(String),

    /// Response body did not match the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Local storage errors (database and config file).
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the local database
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    ConfigLoad { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    ConfigSave { path: PathBuf, message: String },

    /// Unknown or untypable configuration key
    #[error("Invalid configuration key '{key}': {message}")]
    ConfigKey { key: String, message: String },
}

/// Validation errors, rejected at the boundary with no state mutation.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Reminder time must be HH:MM with hour in 0-23 and minute in 0-59.
    #[error("invalid reminder time '{0}': expected HH:MM (24-hour)")]
    InvalidTimeOfDay(String),

    /// Exercise duration must be a whole number of minutes, at least 1.
    #[error("invalid duration '{0}': expected a whole number of minutes")]
    InvalidDuration(String),

    /// Email and password must both be non-empty.
    #[error("enter email and password")]
    EmptyCredentials,
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::QueryFailed(err.to_string())
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Storage(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
