//! Core data types for the extraction pipeline.
//!
//! These types describe a legal document as it flows through the pipeline:
//! raw text in, overlapping chunks out to the extraction client, per-chunk
//! results back, and a single merged [`ExtractedLaw`] at the end. All
//! persisted types serialize with camelCase field names so the JSON artifact
//! stays stable for downstream consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Full text of a source document as produced by the PDF parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDocument {
    /// Full extracted text.
    pub text: String,

    /// Number of pages in the source PDF.
    pub total_pages: usize,

    /// Length of `text` in bytes.
    pub total_characters: usize,
}

impl RawDocument {
    /// Create a raw document, deriving the character total from the text.
    #[must_use]
    pub fn new(text: impl Into<String>, total_pages: usize) -> Self {
        let text = text.into();
        let total_characters = text.len();
        Self {
            text,
            total_pages,
            total_characters,
        }
    }
}

/// A contiguous, possibly overlapping slice of a [`RawDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextChunk {
    /// Zero-based sequential index.
    pub index: usize,

    /// The chunk text, always equal to `document[start_char..end_char]`.
    pub text: String,

    /// Start offset (inclusive) in the source text.
    pub start_char: usize,

    /// End offset (exclusive) in the source text.
    pub end_char: usize,

    /// Whether this chunk starts inside the previous chunk.
    pub has_overlap_from_previous: bool,

    /// Whether the next chunk starts inside this chunk.
    pub has_overlap_into_next: bool,
}

/// Per-section verification outcome.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnchorStatus {
    /// Every anchor was found in the source text.
    Verified,

    /// Some anchors were found, or no anchors could be extracted.
    Partial,

    /// None of the checked anchors were found.
    NotFound,
}

/// Document-level verification verdict.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OverallStatus {
    Pass,
    Review,
    Fail,
}

/// Outcome of comparing the regex section estimate with the extracted count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CountStatus {
    Match,
    Mismatch,
}

/// A single section of a law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSection {
    /// Verbatim section label (e.g., "33(1)(a)").
    pub number: String,

    /// Section heading.
    #[serde(default)]
    pub title: String,

    /// Verbatim legal text.
    pub content: String,

    /// Plain-language paraphrase.
    #[serde(default)]
    pub summary: String,

    /// Position in the final section list. Dense and zero-based after merge.
    #[serde(default)]
    pub order_index: usize,

    /// Extraction confidence in `[0, 1]`.
    pub confidence: f64,

    /// Label of the enclosing section, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_number: Option<String>,

    /// Annotation written by the verification transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<AnchorStatus>,
}

impl ExtractedSection {
    /// Create a section with empty title and summary.
    #[must_use]
    pub fn new(number: impl Into<String>, content: impl Into<String>, confidence: f64) -> Self {
        Self {
            number: number.into(),
            title: String::new(),
            content: content.into(),
            summary: String::new(),
            order_index: 0,
            confidence,
            parent_number: None,
            verification_status: None,
        }
    }

    /// Set the section title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the plain-language summary.
    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Set the order index.
    #[must_use]
    pub fn with_order_index(mut self, order_index: usize) -> Self {
        self.order_index = order_index;
        self
    }

    /// Set the parent section label.
    #[must_use]
    pub fn with_parent(mut self, parent_number: impl Into<String>) -> Self {
        self.parent_number = Some(parent_number.into());
        self
    }
}

/// Document-level metadata guessed by the extraction client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LawMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
}

/// Result of running the extraction client on one chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkExtractionResult {
    pub chunk_index: usize,
    pub sections: Vec<ExtractedSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub law_metadata: Option<LawMetadata>,
    pub confidence: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ChunkExtractionResult {
    /// Create a result with no metadata and no warnings.
    #[must_use]
    pub fn new(chunk_index: usize, sections: Vec<ExtractedSection>, confidence: f64) -> Self {
        Self {
            chunk_index,
            sections,
            law_metadata: None,
            confidence,
            warnings: Vec::new(),
        }
    }

    /// Attach document metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: LawMetadata) -> Self {
        self.law_metadata = Some(metadata);
        self
    }

    /// Attach chunk-level warnings.
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// Provenance and timing for an extraction run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionMeta {
    /// Source file name (e.g., "criminal-code-act.pdf").
    pub source_file: String,

    /// When the merge produced this artifact.
    pub extracted_at: DateTime<Utc>,

    #[serde(default)]
    pub total_pages: usize,

    #[serde(default)]
    pub total_characters: usize,

    #[serde(default)]
    pub total_chunks: usize,

    /// Model identifier used by the extraction client, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Wall-clock time of the extraction run.
    #[serde(default)]
    pub processing_time_ms: u64,

    /// Version of the tool that produced the artifact.
    pub extractor_version: String,
}

/// Law-level information of the final artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LawInfo {
    pub title: String,
    pub short_title: String,
    pub slug: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_amended_date: Option<String>,
}

/// Verification outcome folded back into the artifact as an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationSummary {
    pub status: OverallStatus,
    pub verified_at: DateTime<Utc>,
    pub pdf_section_estimate: usize,
    pub extracted_section_count: usize,
    pub count_status: CountStatus,
    pub verified_sections: usize,
    pub partial_sections: usize,
    pub not_found_sections: usize,
    /// Section numbers whose anchors were not found at all.
    #[serde(default)]
    pub unverified_numbers: Vec<String>,
}

/// Quality verdict for an extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    /// Mean of all chunk and section confidences.
    pub confidence: f64,

    pub warnings: Vec<String>,

    pub manual_review_required: bool,

    /// Section numbers whose confidence is below the low-confidence threshold.
    #[serde(default)]
    pub low_confidence_sections: Vec<String>,

    /// Section numbers whose content is suspiciously short.
    #[serde(default)]
    pub boundary_issues: Vec<String>,

    /// Section numbers whose summary exceeds the display limit.
    #[serde(default)]
    pub long_summaries: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationSummary>,
}

/// The durable output of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedLaw {
    pub meta: ExtractionMeta,
    pub law: LawInfo,
    pub sections: Vec<ExtractedSection>,
    pub quality: QualityAssessment,
}
