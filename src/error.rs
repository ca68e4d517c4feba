//! Error types for the Glaive library.
//!
//! All fallible operations return [`GlaiveError`] through the crate-wide
//! [`Result`] alias. Inference on an untrained model is *not* an error: it is
//! reported through [`crate::classifier::Classification::Untrained`].
//!
//! # Examples
//!
//! ```
//! use glaive::error::{GlaiveError, Result};
//!
//! fn check_corpus(len: usize) -> Result<()> {
//!     if len == 0 {
//!         return Err(GlaiveError::corpus("training corpus is empty"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_corpus(0).is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Glaive operations.
#[derive(Error, Debug)]
pub enum GlaiveError {
    /// I/O errors (reading corpora, writing snapshots, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid hyperparameters or hyperparameter combinations
    #[error("Configuration error: {0}")]
    Config(String),

    /// Empty or malformed training corpus
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Vocabulary inconsistencies
    #[error("Vocabulary error: {0}")]
    Vocabulary(String),

    /// Snapshot that does not describe a consistent model
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// Operation cancelled
    #[error("Operation cancelled: {0}")]
    OperationCancelled(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Binary serialization/deserialization errors
    #[error("Binary encoding error: {0}")]
    Binary(#[from] bincode::Error),

    /// Invalid arguments and lookups of missing items
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with GlaiveError.
pub type Result<T> = std::result::Result<T, GlaiveError>;

impl GlaiveError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Config(msg.into())
    }

    /// Create a new corpus error.
    pub fn corpus<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Corpus(msg.into())
    }

    /// Create a new vocabulary error.
    pub fn vocabulary<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Vocabulary(msg.into())
    }

    /// Create a new snapshot error.
    pub fn snapshot<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Snapshot(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        GlaiveError::Other(format!("Not found: {}", msg.into()))
    }

    /// Create a new cancelled error.
    pub fn cancelled<S: Into<String>>(msg: S) -> Self {
        GlaiveError::OperationCancelled(msg.into())
    }
}
