//! Error types for themr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in themr
#[derive(Debug, Error)]
pub enum ThemrError {
    /// Caller-supplied input rejected before any side effect
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Worker process could not be launched
    #[error("Spawn failure: {0}")]
    Spawn(String),

    /// Theme payload failed structural validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No live identity could be bound to a write
    #[error("Owner resolution failed: {0}")]
    OwnerResolution(String),

    /// Run not tracked by the supervisor
    #[error("Run not found: {0}")]
    RunNotFound(String),

    /// Storage/persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// IPC communication error
    #[error("IPC error: {0}")]
    Ipc(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for themr operations
pub type Result<T> = std::result::Result<T, ThemrError>;
