//! Error types.
//!
//! None of these escape the theme resolver: the preference layer logs them and
//! falls back. They are public so custom [`KeyValueStore`](crate::KeyValueStore)
//! backends and platform hosts can report failures in the same vocabulary.

use std::path::PathBuf;

/// Failure reading or writing the durable key-value store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store is not available at all (no location, disabled).
    #[error("preference store unavailable: {0}")]
    Unavailable(String),
    /// I/O against the backing file failed.
    #[error("failed to access preference file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The backing file exists but does not hold a key-value object.
    #[error("preference file '{}' is corrupted: {source}", .path.display())]
    Corrupted {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A persisted or user-supplied theme mode name that matches no mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized theme mode '{0}'")]
pub struct ParseModeError(pub String);

/// Failure interpreting the host platform's payload.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("invalid platform payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("theme parameter '{name}' has invalid color '{value}'")]
    InvalidColor { name: &'static str, value: String },
}
