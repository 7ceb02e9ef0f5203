//! Integration tests for the LLM transport and the extraction pipeline.

use lawtext_core::merger::MergeOptions;
use lawtext_core::types::{OverallStatus, RawDocument};
use lawtext_core::verifier::{apply_verification, verify_law};
use lawtext_core::VerifierConfig;
use lawtext_extractor::{
    AnthropicClient, ExtractionPipeline, ExtractorConfig, ExtractorError, LlmClient, LlmRequest,
    LlmSectionExtractor, Message, MockLlmClient, Role,
};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RAW_TEXT: &str = "POLICE ACT, 2020\n\n\
1.  Short title\n2.  Establishment of the Police Force\n\n\
1. (1) This Act may be cited as the Police Act of the Federal Republic of Nigeria.\n\n\
2. (1) There is established the Nigeria Police Force which shall be under the command of the Inspector-General of Police.\n";

fn anthropic_response(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "msg_test",
        "type": "message",
        "role": "assistant",
        "content": [
            {
                "type": "text",
                "text": content
            }
        ],
        "model": "claude-sonnet-4-20250514",
        "usage": {
            "input_tokens": 500,
            "output_tokens": 300
        }
    })
}

fn sections_json() -> String {
    serde_json::json!({
        "lawMetadata": {
            "title": "Police Act, 2020",
            "shortTitle": "Police Act",
            "effectiveDate": "2020-09-16"
        },
        "sections": [
            {
                "number": "1",
                "title": "Short title",
                "content": "This Act may be cited as the Police Act of the Federal Republic of Nigeria.",
                "summary": "Gives the Act its name.",
                "confidence": 0.95
            },
            {
                "number": "2",
                "title": "Establishment of the Police Force",
                "content": "There is established the Nigeria Police Force which shall be under the command of the Inspector-General of Police.",
                "summary": "Creates the Police Force.",
                "confidence": 0.9
            }
        ],
        "confidence": 0.92,
        "warnings": []
    })
    .to_string()
}

fn request() -> LlmRequest {
    LlmRequest {
        system: "system".into(),
        messages: vec![Message {
            role: Role::User,
            content: "extract".into(),
        }],
        max_tokens: 1_000,
        temperature: 0.0,
    }
}

fn config_for(server: &MockServer) -> ExtractorConfig {
    ExtractorConfig::builder("test-key")
        .api_base_url(server.uri())
        .model("test-model")
        .request_delay_ms(0)
        .retry_base_delay_ms(1)
        .max_retries(2)
        .build()
}

#[tokio::test]
async fn test_client_sends_messages_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "test-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(serde_json::json!({
            "model": "test-model",
            "max_tokens": 1000,
            "system": "system"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response("hello")))
        .expect(1)
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&config_for(&server)).unwrap();
    let response = client.complete(&request()).await.unwrap();

    assert_eq!(response.content, "hello");
    assert_eq!(response.input_tokens, 500);
    assert_eq!(client.model(), Some("test-model"));
}

#[tokio::test]
async fn test_client_maps_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "12"))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&config_for(&server)).unwrap();
    let err = client.complete(&request()).await.unwrap_err();

    assert!(matches!(err, ExtractorError::LlmRateLimited { retry_after_secs: 12 }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_client_maps_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&config_for(&server)).unwrap();
    let err = client.complete(&request()).await.unwrap_err();

    assert!(matches!(err, ExtractorError::LlmApiError { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_client_extracts_api_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "type": "error",
            "error": {"type": "invalid_request_error", "message": "max_tokens too large"}
        })))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&config_for(&server)).unwrap();
    let err = client.complete(&request()).await.unwrap_err();

    match err {
        ExtractorError::LlmApiError { status, ref message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "max_tokens too large");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_client_empty_content_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response("  ")))
        .mount(&server)
        .await;

    let client = AnthropicClient::new(&config_for(&server)).unwrap();
    let err = client.complete(&request()).await.unwrap_err();
    assert!(matches!(err, ExtractorError::LlmEmptyResponse));
}

#[tokio::test]
async fn test_pipeline_retries_server_error_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(anthropic_response(&sections_json())))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = AnthropicClient::new(&config).unwrap();
    let extractor = LlmSectionExtractor::new(&client, &config);

    let law = ExtractionPipeline::new(&extractor, &config)
        .extract_document(
            &RawDocument::new(RAW_TEXT, 1),
            MergeOptions::new("police-act-2020.pdf"),
        )
        .await
        .unwrap();

    assert_eq!(server.received_requests().await.unwrap().len(), 2);
    assert_eq!(law.law.title, "Police Act, 2020");
    assert_eq!(law.law.slug, "police-act-2020");
    assert_eq!(law.meta.model.as_deref(), Some("test-model"));
    assert_eq!(law.sections.len(), 2);
}

#[tokio::test]
async fn test_pipeline_gives_up_on_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let client = AnthropicClient::new(&config).unwrap();
    let extractor = LlmSectionExtractor::new(&client, &config);

    let err = ExtractionPipeline::new(&extractor, &config)
        .extract_document(&RawDocument::new(RAW_TEXT, 1), MergeOptions::new("police.pdf"))
        .await
        .unwrap_err();

    assert!(matches!(err, ExtractorError::LlmApiError { status: 401, .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_multi_chunk_extraction_merges_and_verifies() {
    let chunk0 = r#"```json
{"lawMetadata": {"title": "Police Act, 2020"},
 "sections": [{"number": "1", "content": "This Act may be cited as the Police Act of the Federal Republic of Nigeria.", "confidence": 0.95}],
 "confidence": 0.9}
```"#;
    let chunk1 = r#"{"sections": [
   {"number": "1", "content": "This Act may be cited as the Police Act", "confidence": 0.5},
   {"number": "2", "content": "There is established the Nigeria Police Force which shall be under the command of the Inspector-General of Police.", "confidence": 0.9}
 ],
 "confidence": 0.9,
 "warnings": ["Section 1 truncated at chunk start"]}"#;

    let client = MockLlmClient::with_responses(vec![chunk0, chunk1]);
    let config = ExtractorConfig::builder("test-key")
        .request_delay_ms(0)
        .chunking(200, 40)
        .build();
    let extractor = LlmSectionExtractor::new(&client, &config);

    let law = ExtractionPipeline::new(&extractor, &config)
        .extract_document(&RawDocument::new(RAW_TEXT, 1), MergeOptions::new("police.pdf"))
        .await
        .unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].messages[0].content.contains("Chunk 1 of 2"));
    assert_eq!(law.meta.total_chunks, 2);
    assert_eq!(law.meta.model.as_deref(), Some("mock-model"));
    assert_eq!(law.sections.len(), 2);
    assert_eq!(
        law.sections[0].content,
        "This Act may be cited as the Police Act of the Federal Republic of Nigeria."
    );
    assert!(law
        .quality
        .warnings
        .iter()
        .any(|w| w == "Chunk 1: Section 1 truncated at chunk start"));

    let report = verify_law(&law, RAW_TEXT, &VerifierConfig::default());
    assert_eq!(report.overall_status, OverallStatus::Pass);
    let verified = apply_verification(&law, &report);
    assert_eq!(
        verified.quality.verification.map(|v| v.verified_sections),
        Some(2)
    );
}
