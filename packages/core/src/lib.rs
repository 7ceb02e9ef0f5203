//! lawtext core - chunking, merging and verification of legal text extraction.
//!
//! The extraction pipeline turns a statute's raw text into structured
//! sections in three pure stages:
//!
//! 1. [`chunker`] splits the text into bounded, overlapping chunks that break
//!    at section headers where possible
//! 2. [`merger`] combines per-chunk results from an extraction client,
//!    removing duplicates and scoring overall quality
//! 3. [`verifier`] checks every section against the source using anchor
//!    sentences and a section-count estimate
//!
//! # Example
//!
//! ```
//! use lawtext_core::chunker::chunk_text;
//!
//! let text = "Section 1. Short title.\nSection 2. Interpretation.";
//! let chunks = chunk_text(text, 30_000, 1_000).unwrap();
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].text, text);
//! ```

pub mod chunker;
pub mod config;
pub mod error;
pub mod merger;
pub mod text;
pub mod types;
pub mod verifier;

pub use chunker::{chunk_document, chunk_text};
pub use config::{
    AnchorLexicon, ChunkingConfig, CountTolerance, QualityThresholds, StatusThresholds,
    VerifierConfig,
};
pub use error::{CoreError, Result};
pub use merger::{merge_chunk_results, validate_extracted_law, MergeOptions};
pub use types::{
    AnchorStatus, ChunkExtractionResult, CountStatus, ExtractedLaw, ExtractedSection,
    ExtractionMeta, LawInfo, LawMetadata, OverallStatus, QualityAssessment, RawDocument,
    TextChunk, VerificationSummary,
};
pub use verifier::{apply_verification, verify_law, VerificationReport};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
