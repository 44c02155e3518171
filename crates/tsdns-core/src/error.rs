//! Error types for tsdns
//!
//! This module defines all error types used throughout the crate.

use crate::engine::Action;
use thiserror::Error;

/// Result type alias for tsdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for tsdns
#[derive(Error, Debug)]
pub enum Error {
    /// Peer-status retrieval errors
    #[error("Peer source error: {0}")]
    PeerSource(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a peer source error
    pub fn peer_source(msg: impl Into<String>) -> Self {
        Self::PeerSource(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// A provider call failed while changes were being applied.
///
/// Nothing is rolled back: `applied` lists every change that reached the
/// provider before `source` stopped the run, in the order it was made.
#[derive(Error, Debug)]
#[error("{source} ({} change(s) already applied)", .applied.len())]
pub struct ReconcileError {
    /// Changes that were applied before the failure
    pub applied: Vec<Action>,
    /// The provider failure that aborted the run
    #[source]
    pub source: Error,
}

impl ReconcileError {
    /// Wrap a provider failure together with the changes made so far
    pub fn new(applied: Vec<Action>, source: Error) -> Self {
        Self { applied, source }
    }
}
