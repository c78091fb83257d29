//! Core error types for focuskit-core.
//!
//! A thiserror hierarchy with one sub-enum per concern. Host-adapter
//! failures are deliberately absent: the coordinator treats those as
//! best-effort no-ops (see `session`).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focuskit-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Blocklist generation errors
    #[error("Blocklist error: {0}")]
    Blocklist(#[from] BlocklistError),

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

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Data directory could not be created
    #[error("Failed to prepare data directory: {0}")]
    Io(#[from] std::io::Error),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Blocklist-client errors. The split exists for display purposes only;
/// there is no retry policy.
#[derive(Error, Debug)]
pub enum BlocklistError {
    /// The API rejected the key (HTTP 401/403).
    #[error("authentication failed (HTTP {status}) -- check your API key")]
    Auth { status: u16 },

    /// The request never reached the API.
    #[error("network unavailable: {0}")]
    Network(String),

    /// Any other non-success HTTP status.
    #[error("API error (HTTP {status})")]
    Api { status: u16 },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Parse(String),

    /// No API key available in the environment.
    #[error("no API key -- set the {0} environment variable")]
    MissingKey(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
