//! Section-count cross-check.
//!
//! The number of sections in the source is estimated from heading patterns.
//! This is an approximation: numbered lists that look like headings inflate
//! it and unusual layouts deflate it. The comparison therefore allows a
//! tolerance band instead of demanding equality.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::config::CountTolerance;
use crate::types::CountStatus;

/// Table-of-contents entry: "12.  Short title".
#[allow(clippy::expect_used)] // Static regexes that are guaranteed to be valid
static TOC_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+)\.\s{2,}[A-Z]").expect("valid regex"));

/// Body heading at line start: "12. (1) ...".
#[allow(clippy::expect_used)]
static BODY_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(\d+)\.\s*\(\d+\)").expect("valid regex"));

/// Cross-reference: "section 12".
#[allow(clippy::expect_used)]
static SECTION_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bsection\s+(\d+)").expect("valid regex"));

/// Estimated number of sections in a source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionCountEstimate {
    /// Number of distinct section numbers found.
    pub estimate: usize,
    pub toc_matches: usize,
    pub heading_matches: usize,
    /// Whether the "section N" cross-reference fallback contributed.
    pub used_cross_references: bool,
}

/// Comparison of the estimate against the extracted section count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionCountCheck {
    pub pdf_estimate: usize,
    pub extracted: usize,
    /// Absolute difference between estimate and extracted count.
    pub difference: usize,
    /// Sections in the estimate that were not extracted (zero if more were extracted).
    pub missing: usize,
    pub allowed_difference: f64,
    pub status: CountStatus,
}

/// Estimate the number of sections in `text`.
///
/// Distinct numbers are collected from TOC entries and body headings; only
/// when those yield fewer than `tolerance.cross_reference_fallback_below`
/// numbers are "section N" cross-references added as well.
#[must_use]
pub fn count_sections_in_pdf(text: &str, tolerance: &CountTolerance) -> SectionCountEstimate {
    let mut numbers = BTreeSet::new();

    let toc_matches = collect_numbers(&TOC_ENTRY, text, &mut numbers);
    let heading_matches = collect_numbers(&BODY_HEADING, text, &mut numbers);

    let used_cross_references = numbers.len() < tolerance.cross_reference_fallback_below;
    if used_cross_references {
        collect_numbers(&SECTION_REFERENCE, text, &mut numbers);
    }

    SectionCountEstimate {
        estimate: numbers.len(),
        toc_matches,
        heading_matches,
        used_cross_references,
    }
}

fn collect_numbers(pattern: &Regex, text: &str, numbers: &mut BTreeSet<u64>) -> usize {
    let mut matches = 0;
    for caps in pattern.captures_iter(text) {
        if let Some(n) = caps.get(1).and_then(|m| m.as_str().parse().ok()) {
            numbers.insert(n);
            matches += 1;
        }
    }
    matches
}

/// Compare an estimate with the number of extracted sections.
#[must_use]
pub fn compare_section_count(
    pdf_estimate: usize,
    extracted: usize,
    tolerance: &CountTolerance,
) -> SectionCountCheck {
    let difference = pdf_estimate.abs_diff(extracted);
    let allowed_difference = tolerance.allowed_difference(pdf_estimate);
    let status = if difference as f64 > allowed_difference {
        CountStatus::Mismatch
    } else {
        CountStatus::Match
    };

    SectionCountCheck {
        pdf_estimate,
        extracted,
        difference,
        missing: pdf_estimate.saturating_sub(extracted),
        allowed_difference,
        status,
    }
}
