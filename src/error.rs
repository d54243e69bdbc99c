//! TextWand Error Types
//!
//! Centralized error handling for the selection pipeline.

use thiserror::Error;

/// Central error type for TextWand
#[derive(Error, Debug)]
pub enum WandError {
    /// The OS selection mechanism cannot be reached (e.g. no display session).
    /// Absorbed by callers as "no selection", never fatal.
    #[error("selection source unavailable: {0}")]
    SourceUnavailable(String),

    /// The selection changed between capture and apply.
    #[error("selection is stale")]
    StaleSelection,

    /// No backend response within the dispatch deadline.
    #[error("backend did not respond in time")]
    Timeout,

    /// Backend service not found, or the connection dropped mid-call.
    #[error("processing backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Write-back failed after the target was partially edited.
    /// The applier restores the original text before surfacing this.
    #[error("partial write during apply: {0}")]
    PartialWrite(String),

    /// The host editing surface failed cleanly (target unchanged).
    #[error("edit surface error: {0}")]
    Surface(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for TextWand operations
pub type WandResult<T> = Result<T, WandError>;
