//! Configuration constants and tunable thresholds.
//!
//! Every heuristic threshold used by the merger and verifier lives here so
//! callers can tune them per corpus. Defaults are calibrated for Nigerian
//! federal legislation.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default maximum chunk size in bytes.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 30_000;

/// Default overlap between consecutive chunks in bytes.
pub const DEFAULT_OVERLAP_SIZE: usize = 1_000;

/// Upper bound for the backward break-point search window in bytes.
pub const MAX_BREAK_SEARCH_WINDOW: usize = 5_000;

/// Fraction of the chunk size used as the break-point search window.
pub const BREAK_SEARCH_FRACTION: f64 = 0.10;

/// Confidence assigned when the extraction client omits one.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// Chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkingConfig {
    pub max_chunk_size: usize,
    pub overlap_size: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            overlap_size: DEFAULT_OVERLAP_SIZE,
        }
    }
}

/// Thresholds used by the merger's quality assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityThresholds {
    /// Sections below this confidence are flagged.
    pub low_confidence: f64,

    /// Overall confidence below this requires manual review.
    pub acceptable_confidence: f64,

    /// Share of low-confidence sections above which manual review is required.
    pub max_low_confidence_ratio: f64,

    /// Content shorter than this (in characters) suggests a boundary error.
    pub min_content_length: usize,

    /// Summaries longer than this (in characters) are flagged for display.
    pub max_summary_length: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            low_confidence: 0.7,
            acceptable_confidence: 0.8,
            max_low_confidence_ratio: 0.2,
            min_content_length: 20,
            max_summary_length: 500,
        }
    }
}

/// Word lists driving anchor uniqueness scoring.
///
/// The effectiveness of anchor selection depends entirely on these lists
/// matching the drafting style of the target corpus, so they can be loaded
/// from JSON instead of the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorLexicon {
    /// Terms that make a sentence more likely to be unique (+1 each).
    pub distinctive_terms: Vec<String>,

    /// Phrases that appear everywhere in legislation (-3 each).
    pub boilerplate_phrases: Vec<String>,
}

impl AnchorLexicon {
    /// Parse a lexicon from JSON.
    ///
    /// # Examples
    /// ```
    /// use lawtext_core::config::AnchorLexicon;
    ///
    /// let lexicon = AnchorLexicon::from_json(
    ///     r#"{"distinctiveTerms": ["sheriff"], "boilerplatePhrases": ["hereby"]}"#,
    /// ).unwrap();
    /// assert_eq!(lexicon.distinctive_terms, vec!["sheriff"]);
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let mut lexicon: Self = serde_json::from_str(json)?;
        lexicon.lowercase();
        Ok(lexicon)
    }

    fn lowercase(&mut self) {
        for term in &mut self.distinctive_terms {
            *term = term.to_lowercase();
        }
        for phrase in &mut self.boilerplate_phrases {
            *phrase = phrase.to_lowercase();
        }
    }
}

impl Default for AnchorLexicon {
    fn default() -> Self {
        let distinctive_terms = [
            "naira",
            "kobo",
            "₦",
            "court",
            "tribunal",
            "magistrate",
            "judge",
            "registrar",
            "commissioner",
            "minister",
            "governor",
            "president",
            "attorney-general",
            "inspector-general",
            "officer",
            "imprisonment",
            "fine",
            "penalty",
            "forfeiture",
            "conviction",
            "offence",
            "liable",
        ];
        let boilerplate_phrases = [
            "notwithstanding the provisions of",
            "subject to",
            "pursuant to",
            "in accordance with",
            "for the purposes of",
            "without prejudice to",
            "except as otherwise provided",
            "as the case may be",
            "shall have effect",
        ];
        Self {
            distinctive_terms: distinctive_terms.iter().map(|s| (*s).to_string()).collect(),
            boilerplate_phrases: boilerplate_phrases
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// Ratios controlling the document-level verification verdict.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusThresholds {
    /// Missing sections above this share of the estimate fail the document.
    pub max_missing_ratio: f64,

    /// Not-found sections above this share of all sections fail the document.
    pub max_not_found_ratio: f64,

    /// Partial sections above this share of all sections require review.
    pub max_partial_ratio: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            max_missing_ratio: 0.10,
            max_not_found_ratio: 0.05,
            max_partial_ratio: 0.10,
        }
    }
}

/// Tolerance band around the regex section-count estimate.
///
/// The estimate is heuristic; a difference is only a mismatch when it
/// exceeds `max(ratio * estimate, floor)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountTolerance {
    pub ratio: f64,
    pub floor: usize,

    /// The cross-reference fallback only runs when the heading strategies
    /// find fewer distinct numbers than this.
    pub cross_reference_fallback_below: usize,
}

impl CountTolerance {
    /// Allowed absolute difference for a given estimate.
    #[must_use]
    pub fn allowed_difference(&self, estimate: usize) -> f64 {
        (self.ratio * estimate as f64).max(self.floor as f64)
    }
}

impl Default for CountTolerance {
    fn default() -> Self {
        Self {
            ratio: 0.05,
            floor: 2,
            cross_reference_fallback_below: 50,
        }
    }
}

/// Full verifier configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifierConfig {
    #[serde(default)]
    pub lexicon: AnchorLexicon,
    #[serde(default)]
    pub status: StatusThresholds,
    #[serde(default)]
    pub count: CountTolerance,
}

impl VerifierConfig {
    /// Replace the anchor lexicon.
    #[must_use]
    pub fn with_lexicon(mut self, lexicon: AnchorLexicon) -> Self {
        self.lexicon = lexicon;
        self
    }
}
