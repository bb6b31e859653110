//! Error types for stage operations.
//!
//! Resolution misses and missing subsystems are not errors; they are silent
//! no-ops. Only configuration, render runtime and host hook failures surface.

use thiserror::Error;

/// Result type for stage operations.
pub type StageResult<T> = Result<T, StageError>;

/// Errors that can occur in stage operations.
#[derive(Debug, Error)]
pub enum StageError {
    /// Construction-time options are inconsistent.
    #[error("Invalid stage configuration: {0}")]
    InvalidConfig(String),

    /// The render runtime failed to apply a request.
    #[error("Render runtime error: {0}")]
    Runtime(String),

    /// A host hook (`can_select`, `is_container`, ...) failed.
    #[error("Host hook failed: {0}")]
    Hook(String),

    /// Option or payload (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
