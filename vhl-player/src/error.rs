//! Error types for vhl-player
//!
//! Only the persistence and fetch boundaries produce errors. Playback,
//! transport and transcript operations treat missing media or unknown ids
//! as no-ops rather than faults.

use thiserror::Error;

/// Main error type for vhl-player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Project store write/read failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// No saved project in the store
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    /// Saved project could not be interpreted
    #[error("Corrupt project: {0}")]
    CorruptProject(String),

    /// Transcript fetch from the transcription backend failed
    #[error("Transcript fetch error: {0}")]
    Fetch(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encode/decode errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the shared library
    #[error(transparent)]
    Common(#[from] vhl_common::Error),
}

/// Convenience Result type using vhl-player Error
pub type Result<T> = std::result::Result<T, Error>;
