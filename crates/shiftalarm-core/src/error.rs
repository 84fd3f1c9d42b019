//! Core error types for shiftalarm-core.
//!
//! Pure cycle arithmetic never fails on valid values; the errors here cover
//! construction-time validation, configuration files and the SQLite store.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for shiftalarm-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Notification collaborator refused a request
    #[error("Notification error for alarm '{alarm_id}': {message}")]
    Notify { alarm_id: String, message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
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

    /// Stored record could not be decoded
    #[error("Corrupt record '{id}' in {table}: {message}")]
    CorruptRecord {
        table: &'static str,
        id: String,
        message: String,
    },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),

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
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A shift pattern needs at least one day in its cycle
    #[error("Shift cycle must contain at least one day")]
    EmptyCycle,

    /// A shift alarm needs at least one target shift
    #[error("Shift alarm must target at least one shift type")]
    EmptyTargetShifts,

    /// Day counts and horizons cannot be negative
    #[error("Invalid value for '{field}': {value} is negative")]
    NegativeDays { field: &'static str, value: i64 },

    /// Shift code typed by a user that matches no shift type
    #[error("Unknown shift code '{0}'")]
    UnknownShiftCode(String),

    /// Weekday outside 1 (Monday) ..= 7 (Sunday)
    #[error("Invalid weekday {0}: expected 1 (Monday) to 7 (Sunday)")]
    InvalidWeekday(u8),

    /// Volume outside 0.0 ..= 1.0
    #[error("Invalid volume {0}: expected 0.0 to 1.0")]
    InvalidVolume(f32),

    /// Time of day out of range or unparseable
    #[error("Invalid time of day '{0}': expected HH:MM")]
    InvalidTime(String),

    /// Calendar date could not be parsed
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
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

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
