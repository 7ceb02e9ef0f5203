//! The extraction client: turns one chunk of text into candidate sections.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use lawtext_core::config::NEUTRAL_CONFIDENCE;
use lawtext_core::types::{ChunkExtractionResult, ExtractedSection, LawMetadata};

use crate::client::{LlmClient, LlmRequest, Message};
use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, Result};
use crate::prompt;

/// Input for extracting sections from one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRequest {
    pub chunk_text: String,
    pub filename: String,
    pub chunk_index: usize,
    pub total_chunks: usize,
    /// Order index assigned to the first section when the response has none.
    pub starting_order_index: usize,
}

/// Capability of turning chunk text into candidate sections.
///
/// The merger and verifier never depend on how this is done, so tests can
/// substitute a deterministic implementation.
#[async_trait]
pub trait SectionExtractor: Send + Sync {
    async fn extract(&self, request: &ChunkRequest) -> Result<ChunkExtractionResult>;

    /// Model identifier recorded in extraction metadata.
    fn model(&self) -> Option<&str> {
        None
    }
}

/// Section extractor backed by an LLM.
pub struct LlmSectionExtractor<'a, C: LlmClient> {
    client: &'a C,
    config: &'a ExtractorConfig,
}

impl<'a, C: LlmClient> LlmSectionExtractor<'a, C> {
    pub fn new(client: &'a C, config: &'a ExtractorConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl<C: LlmClient> SectionExtractor for LlmSectionExtractor<'_, C> {
    async fn extract(&self, request: &ChunkRequest) -> Result<ChunkExtractionResult> {
        debug!(
            chunk = request.chunk_index,
            total = request.total_chunks,
            bytes = request.chunk_text.len(),
            "extracting sections"
        );

        let llm_request = LlmRequest {
            system: prompt::build_system_prompt().to_string(),
            messages: vec![Message::user(prompt::build_chunk_prompt(request))],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self.client.complete(&llm_request).await?;
        debug!(
            chunk = request.chunk_index,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "LLM response received"
        );

        parse_chunk_response(&response.content, request)
    }

    fn model(&self) -> Option<&str> {
        self.client.model()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChunkResponse {
    #[serde(default)]
    sections: Vec<RawSection>,
    #[serde(default, alias = "law_metadata")]
    law_metadata: Option<RawMetadata>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    warnings: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSection {
    #[serde(default)]
    number: Option<serde_json::Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default, alias = "parent_number")]
    parent_number: Option<serde_json::Value>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default, alias = "order_index")]
    order_index: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, alias = "short_title")]
    short_title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default, alias = "effective_date")]
    effective_date: Option<String>,
}

/// Parse an LLM response into a chunk result.
///
/// Tolerates markdown fences and surrounding prose, a missing
/// `lawMetadata` and a missing `confidence` (defaults to 0.5). Confidences
/// are clamped to `[0, 1]`. Sections without a number or content are
/// dropped with a warning.
///
/// # Errors
/// Returns [`ExtractorError::LlmResponseParse`] when no JSON object can be
/// parsed from the response.
pub fn parse_chunk_response(response: &str, request: &ChunkRequest) -> Result<ChunkExtractionResult> {
    let json = extract_json_from_response(response);
    let raw: RawChunkResponse = serde_json::from_str(&json).map_err(|e| {
        ExtractorError::LlmResponseParse(format!("chunk {}: {e}", request.chunk_index))
    })?;

    let mut warnings = raw.warnings;
    let mut sections = Vec::with_capacity(raw.sections.len());

    for (i, section) in raw.sections.into_iter().enumerate() {
        let number = section.number.as_ref().and_then(label_from_value);
        let content = section.content.map(|c| c.trim().to_string()).filter(|c| !c.is_empty());

        let (number, content) = match (number, content) {
            (Some(number), Some(content)) => (number, content),
            (number, _) => {
                let label = number.unwrap_or_else(|| format!("#{}", i + 1));
                warn!(chunk = request.chunk_index, section = %label, "dropping incomplete section");
                warnings.push(format!("Dropped section {label}: missing number or content"));
                continue;
            }
        };

        sections.push(ExtractedSection {
            number,
            title: section.title.unwrap_or_default().trim().to_string(),
            content,
            summary: section.summary.unwrap_or_default().trim().to_string(),
            order_index: section
                .order_index
                .unwrap_or(request.starting_order_index + i),
            confidence: clamp_confidence(section.confidence),
            parent_number: section.parent_number.as_ref().and_then(label_from_value),
            verification_status: None,
        });
    }

    let mut result =
        ChunkExtractionResult::new(request.chunk_index, sections, clamp_confidence(raw.confidence))
            .with_warnings(warnings);
    if let Some(metadata) = raw.law_metadata {
        result = result.with_metadata(LawMetadata {
            title: metadata.title,
            short_title: metadata.short_title,
            description: metadata.description,
            effective_date: metadata.effective_date,
        });
    }

    Ok(result)
}

/// Section labels arrive as strings or bare numbers.
fn label_from_value(value: &serde_json::Value) -> Option<String> {
    let label = match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!label.is_empty()).then_some(label)
}

fn clamp_confidence(confidence: Option<f64>) -> f64 {
    match confidence {
        Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
        _ => NEUTRAL_CONFIDENCE,
    }
}

/// Fenced code block: the opening fence line (with any language tag) is
/// skipped, the body runs to the next fence.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static FENCED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```[^\n]*\n(.*?)```").expect("valid regex"));

/// Extract the JSON object from an LLM response.
///
/// Prefers a fenced block that holds an object; otherwise takes the span
/// from the first `{` to the last `}`.
pub fn extract_json_from_response(response: &str) -> String {
    let trimmed = response.trim();

    let fenced_object = FENCED_BLOCK
        .captures_iter(trimmed)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .find(|body| body.starts_with('{'));
    if let Some(body) = fenced_object {
        return body.to_string();
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => trimmed[start..=end].to_string(),
        _ => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::MockLlmClient;
    use pretty_assertions::assert_eq;

    fn request(chunk_index: usize) -> ChunkRequest {
        ChunkRequest {
            chunk_text: "Section 1. Short title.".into(),
            filename: "police-act.pdf".into(),
            chunk_index,
            total_chunks: 2,
            starting_order_index: 10,
        }
    }

    #[test]
    fn test_parse_full_response() {
        let response = r#"{
            "lawMetadata": {"title": "Police Act", "shortTitle": "Police Act 2020", "effectiveDate": "2020-09-16"},
            "sections": [
                {"number": "1", "title": "Short title", "content": "This Act may be cited as the Police Act.", "summary": "Names the Act.", "confidence": 0.95},
                {"number": 2, "content": "In this Act, unless the context otherwise requires.", "parentNumber": null}
            ],
            "confidence": 0.9,
            "warnings": ["Section 2 may continue"]
        }"#;

        let result = parse_chunk_response(response, &request(0)).unwrap();

        assert_eq!(result.chunk_index, 0);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.warnings, vec!["Section 2 may continue".to_string()]);
        assert_eq!(result.sections.len(), 2);
        assert_eq!(result.sections[0].title, "Short title");
        assert_eq!(result.sections[0].order_index, 10);
        assert_eq!(result.sections[1].number, "2");
        assert_eq!(result.sections[1].order_index, 11);
        assert_eq!(result.sections[1].confidence, 0.5);
        let metadata = result.law_metadata.unwrap();
        assert_eq!(metadata.title.as_deref(), Some("Police Act"));
        assert_eq!(metadata.effective_date.as_deref(), Some("2020-09-16"));
    }

    #[test]
    fn test_parse_tolerates_missing_metadata_and_confidence() {
        let result = parse_chunk_response(r#"{"sections": []}"#, &request(1)).unwrap();
        assert!(result.law_metadata.is_none());
        assert_eq!(result.confidence, 0.5);
        assert!(result.sections.is_empty());
    }

    #[test]
    fn test_parse_clamps_confidence() {
        let response = r#"{"sections": [{"number": "1", "content": "Text of the section.", "confidence": 1.7}], "confidence": -0.2}"#;
        let result = parse_chunk_response(response, &request(1)).unwrap();
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.sections[0].confidence, 1.0);
    }

    #[test]
    fn test_parse_drops_incomplete_sections() {
        let response = r#"{"sections": [{"number": "4", "content": "  "}, {"content": "Orphan text"}]}"#;
        let result = parse_chunk_response(response, &request(1)).unwrap();
        assert!(result.sections.is_empty());
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("Dropped section 4"));
        assert!(result.warnings[1].contains("Dropped section #2"));
    }

    #[test]
    fn test_parse_malformed_json_is_error() {
        let err = parse_chunk_response("I could not find any sections.", &request(3)).unwrap_err();
        assert!(matches!(err, ExtractorError::LlmResponseParse(_)));
        assert!(err.to_string().contains("chunk 3"));
    }

    #[test]
    fn test_extract_json_from_fence() {
        let response = "Here you go:\n```json\n{\"sections\": []}\n```\nDone.";
        assert_eq!(extract_json_from_response(response), "{\"sections\": []}");
    }

    #[test]
    fn test_extract_json_skips_non_object_fence() {
        let response = "```text\nsee below\n```\n```\n{\"sections\": []}\n```";
        assert_eq!(extract_json_from_response(response), "{\"sections\": []}");
    }

    #[test]
    fn test_extract_json_from_prose() {
        let response = "Result: {\"sections\": []} as requested";
        assert_eq!(extract_json_from_response(response), "{\"sections\": []}");
    }

    #[test]
    fn test_extract_json_plain() {
        assert_eq!(extract_json_from_response("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn test_llm_extractor_sends_chunk_prompt() {
        let client = MockLlmClient::with_response(
            r#"{"sections": [{"number": "1", "content": "This Act may be cited as the Police Act."}], "confidence": 0.8}"#,
        );
        let config = ExtractorConfig::builder("test-key").max_tokens(4_000).build();
        let extractor = LlmSectionExtractor::new(&client, &config);

        let result = extractor.extract(&request(0)).await.unwrap();

        assert_eq!(result.sections.len(), 1);
        assert_eq!(extractor.model(), Some("mock-model"));
        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].max_tokens, 4_000);
        assert!(requests[0].messages[0].content.contains("Section 1. Short title."));
    }
}
