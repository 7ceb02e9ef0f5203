//! Merging of per-chunk extraction results into one law.
//!
//! Overlapping chunks mean the same section is often extracted twice, and
//! chunk-local order indices say nothing about global order. The merger
//! deduplicates by normalized section number (keeping the more confident
//! copy), sorts by the numeric part of the label, renumbers densely and
//! computes a quality verdict that tells a human whether to look closer.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::config::QualityThresholds;
use crate::text::{leading_number, normalize_section_number, slugify, title_from_filename};
use crate::types::{
    ChunkExtractionResult, ExtractedLaw, ExtractedSection, ExtractionMeta, LawInfo,
    QualityAssessment, RawDocument,
};

/// Default category when none is supplied.
pub const DEFAULT_CATEGORY: &str = "general";

/// Inputs to a merge that do not come from the chunk results.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Source file name; also the fallback title source.
    pub filename: String,

    /// Explicit slug. Derived from the title when absent.
    pub slug: Option<String>,

    pub category: String,

    pub total_pages: usize,

    pub total_characters: usize,

    pub model: Option<String>,

    pub processing_time_ms: u64,

    /// Timestamp recorded in the artifact. `None` means now.
    pub extracted_at: Option<DateTime<Utc>>,

    pub thresholds: QualityThresholds,
}

impl MergeOptions {
    /// Create options for a source file with default thresholds.
    #[must_use]
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slug: None,
            category: DEFAULT_CATEGORY.to_string(),
            total_pages: 0,
            total_characters: 0,
            model: None,
            processing_time_ms: 0,
            extracted_at: None,
            thresholds: QualityThresholds::default(),
        }
    }

    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Record page and character totals of the source document.
    #[must_use]
    pub fn with_document(mut self, document: &RawDocument) -> Self {
        self.total_pages = document.total_pages;
        self.total_characters = document.total_characters;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn with_processing_time_ms(mut self, processing_time_ms: u64) -> Self {
        self.processing_time_ms = processing_time_ms;
        self
    }

    #[must_use]
    pub fn with_extracted_at(mut self, extracted_at: DateTime<Utc>) -> Self {
        self.extracted_at = Some(extracted_at);
        self
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: QualityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }
}

/// Merge chunk results into a single law.
///
/// Never fails: an empty result list produces a law with no sections that
/// is flagged for manual review, so failed pipelines still leave an
/// inspectable artifact.
pub fn merge_chunk_results(results: &[ChunkExtractionResult], options: &MergeOptions) -> ExtractedLaw {
    let mut ordered: Vec<&ChunkExtractionResult> = results.iter().collect();
    ordered.sort_by_key(|r| r.chunk_index);

    let law = build_law_info(&ordered, options);
    let mut warnings: Vec<String> = Vec::new();

    for result in &ordered {
        for warning in &result.warnings {
            warnings.push(format!("Chunk {}: {}", result.chunk_index, warning));
        }
    }

    let sections = dedupe_and_order(&ordered, &mut warnings);

    let meta = ExtractionMeta {
        source_file: options.filename.clone(),
        extracted_at: options.extracted_at.unwrap_or_else(Utc::now),
        total_pages: options.total_pages,
        total_characters: options.total_characters,
        total_chunks: results.len(),
        model: options.model.clone(),
        processing_time_ms: options.processing_time_ms,
        extractor_version: crate::VERSION.to_string(),
    };

    let quality = if ordered.is_empty() {
        warnings.push("No chunk results to merge; extraction produced no sections".to_string());
        QualityAssessment {
            confidence: 0.0,
            warnings,
            manual_review_required: true,
            low_confidence_sections: Vec::new(),
            boundary_issues: Vec::new(),
            long_summaries: Vec::new(),
            verification: None,
        }
    } else {
        assess_quality(&ordered, &sections, warnings, &options.thresholds)
    };

    tracing::info!(
        slug = %law.slug,
        chunks = results.len(),
        sections = sections.len(),
        confidence = quality.confidence,
        manual_review = quality.manual_review_required,
        "Merged chunk results"
    );

    ExtractedLaw {
        meta,
        law,
        sections,
        quality,
    }
}

/// Law metadata from chunk 0 only, with a filename-derived fallback.
fn build_law_info(ordered: &[&ChunkExtractionResult], options: &MergeOptions) -> LawInfo {
    let metadata = ordered
        .iter()
        .find(|r| r.chunk_index == 0)
        .and_then(|r| r.law_metadata.clone())
        .unwrap_or_default();

    let fallback_source = options.slug.as_deref().unwrap_or(&options.filename);
    let title = non_empty(metadata.title).unwrap_or_else(|| title_from_filename(fallback_source));
    let short_title = non_empty(metadata.short_title).unwrap_or_else(|| title.clone());
    let slug = options.slug.clone().unwrap_or_else(|| slugify(&title));

    LawInfo {
        title,
        short_title,
        slug,
        category: options.category.clone(),
        description: non_empty(metadata.description),
        effective_date: non_empty(metadata.effective_date),
        last_amended_date: None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Deduplicate by normalized number, sort and renumber densely.
fn dedupe_and_order(
    ordered: &[&ChunkExtractionResult],
    warnings: &mut Vec<String>,
) -> Vec<ExtractedSection> {
    let mut kept: Vec<ExtractedSection> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for result in ordered {
        for section in &result.sections {
            let key = normalize_section_number(&section.number);
            match positions.get(&key) {
                None => {
                    positions.insert(key, kept.len());
                    kept.push(section.clone());
                }
                Some(&pos) => {
                    let existing = &kept[pos];
                    if section.confidence > existing.confidence {
                        warnings.push(format!(
                            "Duplicate section {} in chunk {}: replaced earlier copy (confidence {:.2}) with higher-confidence copy ({:.2})",
                            section.number, result.chunk_index, existing.confidence, section.confidence
                        ));
                        kept[pos] = section.clone();
                    } else {
                        warnings.push(format!(
                            "Duplicate section {} in chunk {}: discarded copy with confidence {:.2} (kept {:.2})",
                            section.number, result.chunk_index, section.confidence, existing.confidence
                        ));
                    }
                    tracing::debug!(number = %section.number, chunk = result.chunk_index, "Dropped duplicate section");
                }
            }
        }
    }

    // Stable sort: equal keys keep first-seen order
    kept.sort_by_key(|s| (leading_number(&s.number), s.order_index));

    for (index, section) in kept.iter_mut().enumerate() {
        section.order_index = index;
    }

    kept
}

fn assess_quality(
    ordered: &[&ChunkExtractionResult],
    sections: &[ExtractedSection],
    mut warnings: Vec<String>,
    thresholds: &QualityThresholds,
) -> QualityAssessment {
    let mut low_confidence_sections = Vec::new();
    let mut boundary_issues = Vec::new();
    let mut long_summaries = Vec::new();

    for section in sections {
        if section.confidence < thresholds.low_confidence {
            low_confidence_sections.push(section.number.clone());
        }

        let content_length = section.content.trim().chars().count();
        if content_length < thresholds.min_content_length {
            boundary_issues.push(section.number.clone());
            warnings.push(format!(
                "Section {} content is only {} characters; possible chunk boundary or truncation error",
                section.number, content_length
            ));
        }

        if section.summary.chars().count() > thresholds.max_summary_length {
            long_summaries.push(section.number.clone());
        }
    }

    let confidences: Vec<f64> = ordered
        .iter()
        .map(|r| r.confidence)
        .chain(sections.iter().map(|s| s.confidence))
        .collect();
    let confidence = if confidences.is_empty() {
        0.0
    } else {
        confidences.iter().sum::<f64>() / confidences.len() as f64
    };

    let low_confidence_ratio = if sections.is_empty() {
        0.0
    } else {
        low_confidence_sections.len() as f64 / sections.len() as f64
    };

    let manual_review_required = confidence < thresholds.acceptable_confidence
        || low_confidence_ratio > thresholds.max_low_confidence_ratio
        || !boundary_issues.is_empty();

    QualityAssessment {
        confidence,
        warnings,
        manual_review_required,
        low_confidence_sections,
        boundary_issues,
        long_summaries,
        verification: None,
    }
}

/// Check a merged law for structural problems.
///
/// Returns human-readable errors instead of failing, so the caller decides
/// whether to proceed. An empty list means the law is structurally valid.
#[must_use]
pub fn validate_extracted_law(law: &ExtractedLaw) -> Vec<String> {
    let mut errors = Vec::new();

    if law.law.slug.trim().is_empty() {
        errors.push("Missing law slug".to_string());
    }
    if law.law.title.trim().is_empty() {
        errors.push("Missing law title".to_string());
    }
    if law.law.category.trim().is_empty() {
        errors.push("Missing law category".to_string());
    }
    if law.sections.is_empty() {
        errors.push("Law has no sections".to_string());
    }

    let mut seen: HashSet<String> = HashSet::new();
    for section in &law.sections {
        let key = normalize_section_number(&section.number);
        if !seen.insert(key) {
            errors.push(format!("Duplicate section number: {}", section.number));
        }
    }

    for (expected, section) in law.sections.iter().enumerate() {
        if section.order_index != expected {
            errors.push(format!(
                "Section {} has order index {} but expected {}",
                section.number, section.order_index, expected
            ));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LawMetadata;
    use pretty_assertions::assert_eq;

    fn section(number: &str, confidence: f64, order: usize) -> ExtractedSection {
        ExtractedSection::new(
            number,
            format!("Content of section {number} which is long enough to pass."),
            confidence,
        )
        .with_order_index(order)
    }

    fn numbers(law: &ExtractedLaw) -> Vec<&str> {
        law.sections.iter().map(|s| s.number.as_str()).collect()
    }

    #[test]
    fn test_metadata_from_first_chunk() {
        let metadata = LawMetadata {
            title: Some("Police Act, 2020".to_string()),
            short_title: Some("Police Act".to_string()),
            description: None,
            effective_date: Some("2020-09-16".to_string()),
        };
        let results = vec![
            ChunkExtractionResult::new(0, vec![section("1", 0.9, 0)], 0.9).with_metadata(metadata),
            ChunkExtractionResult::new(1, vec![section("2", 0.9, 1)], 0.9).with_metadata(
                LawMetadata {
                    title: Some("Wrong Title".to_string()),
                    ..LawMetadata::default()
                },
            ),
        ];
        let law = merge_chunk_results(&results, &MergeOptions::new("police.pdf"));
        assert_eq!(law.law.title, "Police Act, 2020");
        assert_eq!(law.law.short_title, "Police Act");
        assert_eq!(law.law.slug, "police-act-2020");
        assert_eq!(law.law.effective_date.as_deref(), Some("2020-09-16"));
    }

    #[test]
    fn test_metadata_fallback_from_filename() {
        let results = vec![ChunkExtractionResult::new(0, vec![section("1", 0.9, 0)], 0.9)];
        let law = merge_chunk_results(&results, &MergeOptions::new("evidence-act.pdf"));
        assert_eq!(law.law.title, "Evidence Act");
        assert_eq!(law.law.short_title, "Evidence Act");
        assert_eq!(law.law.slug, "evidence-act");
        assert_eq!(law.law.category, "general");
    }

    #[test]
    fn test_metadata_fallback_prefers_explicit_slug() {
        let results = vec![ChunkExtractionResult::new(0, vec![section("1", 0.9, 0)], 0.9)];
        let options = MergeOptions::new("upload-123.pdf")
            .with_slug("labour-act")
            .with_category("employment");
        let law = merge_chunk_results(&results, &options);
        assert_eq!(law.law.title, "Labour Act");
        assert_eq!(law.law.slug, "labour-act");
        assert_eq!(law.law.category, "employment");
    }

    #[test]
    fn test_duplicate_keeps_higher_confidence() {
        let results = vec![
            ChunkExtractionResult::new(0, vec![section("Section 4", 0.6, 0)], 0.8),
            ChunkExtractionResult::new(1, vec![section("4", 0.95, 0)], 0.8),
        ];
        let law = merge_chunk_results(&results, &MergeOptions::new("a.pdf"));
        assert_eq!(law.sections.len(), 1);
        assert_eq!(law.sections[0].number, "4");
        assert_eq!(law.sections[0].confidence, 0.95);
        let duplicates = law
            .quality
            .warnings
            .iter()
            .filter(|w| w.contains("Duplicate"))
            .count();
        assert_eq!(duplicates, 1);
    }

    #[test]
    fn test_duplicate_tie_keeps_first() {
        let first = section("7", 0.9, 0).with_title("First");
        let second = section("7", 0.9, 0).with_title("Second");
        let results = vec![
            ChunkExtractionResult::new(0, vec![first], 0.9),
            ChunkExtractionResult::new(1, vec![second], 0.9),
        ];
        let law = merge_chunk_results(&results, &MergeOptions::new("a.pdf"));
        assert_eq!(law.sections[0].title, "First");
    }

    #[test]
    fn test_sort_by_leading_number_and_reindex() {
        let results = vec![
            ChunkExtractionResult::new(
                1,
                vec![section("10", 0.9, 0), section("2", 0.9, 1)],
                0.9,
            ),
            ChunkExtractionResult::new(
                0,
                vec![section("1", 0.9, 5), section("1A", 0.9, 6), section("Part I", 0.9, 7)],
                0.9,
            ),
        ];
        let law = merge_chunk_results(&results, &MergeOptions::new("a.pdf"));
        assert_eq!(numbers(&law), vec!["Part I", "1", "1A", "2", "10"]);
        let indices: Vec<usize> = law.sections.iter().map(|s| s.order_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_empty_results() {
        let law = merge_chunk_results(&[], &MergeOptions::new("empty.pdf"));
        assert!(law.sections.is_empty());
        assert!(law.quality.manual_review_required);
        assert_eq!(law.quality.confidence, 0.0);
        assert!(law.quality.warnings.iter().any(|w| w.contains("No chunk results")));
        assert_eq!(law.meta.total_chunks, 0);
    }

    #[test]
    fn test_chunk_warnings_collected() {
        let results = vec![ChunkExtractionResult::new(0, vec![section("1", 0.9, 0)], 0.9)
            .with_warnings(vec!["Table on page 3 skipped".to_string()])];
        let law = merge_chunk_results(&results, &MergeOptions::new("a.pdf"));
        assert!(law
            .quality
            .warnings
            .contains(&"Chunk 0: Table on page 3 skipped".to_string()));
    }

    #[test]
    fn test_confidence_is_mean_of_chunks_and_sections() {
        let results = vec![ChunkExtractionResult::new(
            0,
            vec![section("1", 1.0, 0), section("2", 0.8, 1)],
            0.9,
        )];
        let law = merge_chunk_results(&results, &MergeOptions::new("a.pdf"));
        assert!((law.quality.confidence - 0.9).abs() < 1e-9);
        assert!(!law.quality.manual_review_required);
    }

    #[test]
    fn test_low_confidence_ratio_triggers_review() {
        let results = vec![ChunkExtractionResult::new(
            0,
            vec![
                section("1", 1.0, 0),
                section("2", 1.0, 1),
                section("3", 1.0, 2),
                section("4", 0.65, 3),
            ],
            1.0,
        )];
        // 1 of 4 sections (25%) below 0.7, overall mean stays above 0.8
        let law = merge_chunk_results(&results, &MergeOptions::new("a.pdf"));
        assert_eq!(law.quality.low_confidence_sections, vec!["4"]);
        assert!(law.quality.confidence > 0.8);
        assert!(law.quality.manual_review_required);
    }

    #[test]
    fn test_short_content_is_boundary_issue() {
        let short = ExtractedSection::new("3", "(a) the", 0.95);
        let results = vec![ChunkExtractionResult::new(
            0,
            vec![section("1", 0.95, 0), section("2", 0.95, 1), short],
            0.95,
        )];
        let law = merge_chunk_results(&results, &MergeOptions::new("a.pdf"));
        assert_eq!(law.quality.boundary_issues, vec!["3"]);
        assert!(law.quality.manual_review_required);
        assert!(law
            .quality
            .warnings
            .iter()
            .any(|w| w.starts_with("Section 3 content is only")));
    }

    #[test]
    fn test_long_summary_flagged() {
        let long = section("1", 0.95, 0).with_summary("x".repeat(600));
        let results = vec![ChunkExtractionResult::new(0, vec![long], 0.95)];
        let law = merge_chunk_results(&results, &MergeOptions::new("a.pdf"));
        assert_eq!(law.quality.long_summaries, vec!["1"]);
        assert!(!law.quality.manual_review_required);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let results = vec![
            ChunkExtractionResult::new(0, vec![section("2", 0.9, 0), section("1", 0.8, 1)], 0.9),
            ChunkExtractionResult::new(1, vec![section("2", 0.7, 0), section("3", 0.9, 1)], 0.9),
        ];
        let options = MergeOptions::new("a.pdf").with_extracted_at(Utc::now());
        let first = merge_chunk_results(&results, &options);
        let second = merge_chunk_results(&results, &options);
        assert_eq!(first.sections, second.sections);
    }

    #[test]
    fn test_validate_valid_law() {
        let results = vec![ChunkExtractionResult::new(
            0,
            vec![section("1", 0.9, 0), section("2", 0.9, 1)],
            0.9,
        )];
        let law = merge_chunk_results(&results, &MergeOptions::new("police-act.pdf"));
        assert!(validate_extracted_law(&law).is_empty());
    }

    #[test]
    fn test_validate_reports_all_problems() {
        let results = vec![ChunkExtractionResult::new(0, vec![section("1", 0.9, 0)], 0.9)];
        let mut law = merge_chunk_results(&results, &MergeOptions::new("a.pdf"));
        law.law.category = String::new();
        law.sections.push(section("Section 1", 0.9, 5));

        let errors = validate_extracted_law(&law);
        assert!(errors.contains(&"Missing law category".to_string()));
        assert!(errors.contains(&"Duplicate section number: Section 1".to_string()));
        assert!(errors.contains(&"Section Section 1 has order index 5 but expected 1".to_string()));
    }

    #[test]
    fn test_validate_empty_law() {
        let law = merge_chunk_results(&[], &MergeOptions::new("a.pdf"));
        assert_eq!(validate_extracted_law(&law), vec!["Law has no sections".to_string()]);
    }
}
