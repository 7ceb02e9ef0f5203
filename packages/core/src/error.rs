//! Error types for the core library.
//!
//! Only programmer/input errors are represented here. Data-quality problems
//! (low confidence, unverifiable anchors, count mismatches) are never errors;
//! they surface as warnings and flags on the output types.

use thiserror::Error;

/// Main error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Chunk size must be positive.
    #[error("Invalid chunk size: {0}. Maximum chunk size must be greater than zero")]
    InvalidChunkSize(usize),

    /// Anchor lexicon could not be parsed.
    #[error("Invalid anchor lexicon: {0}")]
    InvalidLexicon(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
