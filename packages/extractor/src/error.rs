//! Error types for the extractor.
//!
//! Input and configuration problems fail fast. LLM transport failures are
//! classified by [`ExtractorError::is_transient`] so the pipeline knows
//! which ones to retry.

use thiserror::Error;

use lawtext_core::CoreError;

/// Main error type for the extractor.
#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PDF extraction failed for {path}: {message}")]
    Pdf { path: String, message: String },

    #[error("LLM API request failed: {0}")]
    LlmApiRequest(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    LlmApiError { status: u16, message: String },

    #[error("LLM rate limited, retry after {retry_after_secs}s")]
    LlmRateLimited { retry_after_secs: u64 },

    #[error("failed to parse LLM response: {0}")]
    LlmResponseParse(String),

    #[error("LLM returned empty response")]
    LlmEmptyResponse,

    #[error("chunk {chunk_index} failed after {attempts} attempts: {message}")]
    RetriesExhausted {
        chunk_index: usize,
        attempts: u32,
        message: String,
    },

    #[error("raw text not found for '{slug}': {path}")]
    MissingRawText { slug: String, path: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl ExtractorError {
    /// Whether retrying the same request may succeed.
    ///
    /// Rate limits, server errors, timeouts, connection failures and empty
    /// responses are transient. Client errors and unparseable responses are
    /// not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::LlmRateLimited { .. } | Self::LlmEmptyResponse => true,
            Self::LlmApiError { status, .. } => *status >= 500,
            Self::LlmApiRequest(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Server-requested wait before the next attempt, if any.
    #[must_use]
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::LlmRateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

/// Result type alias for extractor operations.
pub type Result<T> = std::result::Result<T, ExtractorError>;
