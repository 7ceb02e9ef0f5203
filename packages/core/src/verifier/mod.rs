//! Anchor-based verification of extracted sections against source text.
//!
//! - [`normalize`]: text normalization shared by anchors and source
//! - [`anchors`]: anchor selection, scoring and substring search
//! - [`count`]: section-count estimate and tolerance check
//! - [`report`]: per-section status, document verdict and write-back

pub mod anchors;
pub mod count;
pub mod normalize;
pub mod report;

pub use anchors::{anchor_count_for, extract_anchors, search_anchor, split_sentences, AnchorMatch};
pub use count::{compare_section_count, count_sections_in_pdf, SectionCountCheck, SectionCountEstimate};
pub use normalize::normalize;
pub use report::{
    aggregate_status, apply_verification, verify_law, verify_section, SectionVerification,
    StatusTally, VerificationReport,
};
