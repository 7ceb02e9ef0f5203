//! Per-section verification and document-level aggregation.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{AnchorLexicon, StatusThresholds, VerifierConfig};
use crate::types::{
    AnchorStatus, CountStatus, ExtractedLaw, ExtractedSection, OverallStatus, VerificationSummary,
};
use crate::verifier::anchors::{anchor_count_for, extract_anchors, search_anchor, AnchorMatch};
use crate::verifier::count::{compare_section_count, count_sections_in_pdf, SectionCountCheck};
use crate::verifier::normalize::normalize;

/// Verification outcome of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionVerification {
    pub number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub status: AnchorStatus,
    pub anchors: Vec<AnchorMatch>,
}

impl SectionVerification {
    /// Number of anchors found in the source.
    #[must_use]
    pub fn found_count(&self) -> usize {
        self.anchors.iter().filter(|a| a.found).count()
    }
}

/// Full verification result for an extracted law.
///
/// Derived data: it can be recomputed at any time from the artifact and
/// its raw text, and is only persisted as an audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub section_count: SectionCountCheck,
    pub sections: Vec<SectionVerification>,
    pub overall_status: OverallStatus,
    pub summary: VerificationSummary,
}

/// Verify one section against the normalized source text.
///
/// Sections too short to yield an anchor are `partial`: they can be
/// neither confirmed nor refuted.
#[must_use]
pub fn verify_section(
    section: &ExtractedSection,
    normalized_source: &str,
    lexicon: &AnchorLexicon,
) -> SectionVerification {
    let count = anchor_count_for(&section.content);
    let anchors: Vec<AnchorMatch> = extract_anchors(&section.content, count, lexicon)
        .iter()
        .map(|anchor| search_anchor(anchor, normalized_source))
        .collect();

    let found = anchors.iter().filter(|a| a.found).count();
    let status = if anchors.is_empty() {
        AnchorStatus::Partial
    } else if found == anchors.len() {
        AnchorStatus::Verified
    } else if found == 0 {
        AnchorStatus::NotFound
    } else {
        AnchorStatus::Partial
    };

    debug!(
        section = %section.number,
        anchors = anchors.len(),
        found,
        status = %status,
        "section verified"
    );

    SectionVerification {
        number: section.number.clone(),
        title: section.title.clone(),
        status,
        anchors,
    }
}

/// Verify every section of `law` against the raw source text.
#[must_use]
pub fn verify_law(law: &ExtractedLaw, raw_text: &str, config: &VerifierConfig) -> VerificationReport {
    let normalized_source = normalize(raw_text);

    let sections: Vec<SectionVerification> = law
        .sections
        .iter()
        .map(|section| verify_section(section, &normalized_source, &config.lexicon))
        .collect();

    let estimate = count_sections_in_pdf(raw_text, &config.count);
    let section_count = compare_section_count(estimate.estimate, law.sections.len(), &config.count);

    let tally = StatusTally::from_sections(&sections);
    let overall_status = aggregate_status(&section_count, &tally, &config.status);

    info!(
        slug = %law.law.slug,
        status = %overall_status,
        verified = tally.verified,
        partial = tally.partial,
        not_found = tally.not_found,
        pdf_estimate = section_count.pdf_estimate,
        extracted = section_count.extracted,
        "verification complete"
    );

    let summary = VerificationSummary {
        status: overall_status,
        verified_at: Utc::now(),
        pdf_section_estimate: section_count.pdf_estimate,
        extracted_section_count: section_count.extracted,
        count_status: section_count.status,
        verified_sections: tally.verified,
        partial_sections: tally.partial,
        not_found_sections: tally.not_found,
        unverified_numbers: sections
            .iter()
            .filter(|s| s.status == AnchorStatus::NotFound)
            .map(|s| s.number.clone())
            .collect(),
    };

    VerificationReport {
        section_count,
        sections,
        overall_status,
        summary,
    }
}

/// Per-status section counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusTally {
    pub verified: usize,
    pub partial: usize,
    pub not_found: usize,
}

impl StatusTally {
    #[must_use]
    pub fn from_sections(sections: &[SectionVerification]) -> Self {
        let mut tally = Self::default();
        for section in sections {
            match section.status {
                AnchorStatus::Verified => tally.verified += 1,
                AnchorStatus::Partial => tally.partial += 1,
                AnchorStatus::NotFound => tally.not_found += 1,
            }
        }
        tally
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.verified + self.partial + self.not_found
    }
}

/// Fold count and anchor statistics into a document verdict.
///
/// - `fail`: more than `max_missing_ratio` of the estimated sections are
///   missing, or more than `max_not_found_ratio` of sections are `not_found`
/// - `review`: count mismatch, more than `max_partial_ratio` of sections
///   `partial`, or any `not_found` section at all
/// - `pass`: otherwise
///
/// Ratio comparisons are strict, so a share exactly at a threshold does not
/// trip it.
#[must_use]
pub fn aggregate_status(
    count: &SectionCountCheck,
    tally: &StatusTally,
    thresholds: &StatusThresholds,
) -> OverallStatus {
    let total = tally.total();
    let exceeds = |part: usize, whole: usize, ratio: f64| {
        whole > 0 && part as f64 > ratio * whole as f64
    };

    let too_many_missing = exceeds(count.missing, count.pdf_estimate, thresholds.max_missing_ratio);
    let too_many_not_found = exceeds(tally.not_found, total, thresholds.max_not_found_ratio);
    if too_many_missing || too_many_not_found {
        return OverallStatus::Fail;
    }

    let too_many_partial = exceeds(tally.partial, total, thresholds.max_partial_ratio);
    if count.status == CountStatus::Mismatch || too_many_partial || tally.not_found > 0 {
        return OverallStatus::Review;
    }

    OverallStatus::Pass
}

/// Record a verification report in the artifact.
///
/// Returns a new law with `quality.verification` set, each section's
/// `verification_status` annotated and manual review forced on `fail`.
/// Sections are matched to report entries by position.
#[must_use]
pub fn apply_verification(law: &ExtractedLaw, report: &VerificationReport) -> ExtractedLaw {
    let mut updated = law.clone();

    for (section, verification) in updated.sections.iter_mut().zip(&report.sections) {
        section.verification_status = Some(verification.status);
    }

    updated.quality.verification = Some(report.summary.clone());
    if report.overall_status == OverallStatus::Fail {
        updated.quality.manual_review_required = true;
    }

    updated
}
