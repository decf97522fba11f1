//! BookRelay error taxonomy.
//!
//! Expected non-events (deleted record, no-op status, policy skip, empty
//! target set) are *not* errors — they terminate a pipeline as `Ok`
//! outcomes. `RelayError` covers transport and boundary failures only.

use thiserror::Error;

/// Errors produced by BookRelay components.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration load/parse failure.
    #[error("Config error: {0}")]
    Config(String),

    /// Token registry call failed at the transport level.
    #[error("Registry error: {0}")]
    Registry(String),

    /// Push gateway call failed at the transport level (the batch itself,
    /// not an individual token).
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Change-feed connection or protocol failure.
    #[error("Feed error: {0}")]
    Feed(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias used across the workspace.
pub type Result<T> = std::result::Result<T, RelayError>;
