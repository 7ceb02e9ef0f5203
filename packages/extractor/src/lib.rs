//! lawtext extractor - turn legislation PDFs into verified section data.
//!
//! Wraps the pure pipeline of `lawtext-core` with the I/O around it:
//!
//! - [`pdf`]: source loading (PDF or plain text)
//! - [`client`]: LLM transport behind the [`LlmClient`] trait
//! - [`extraction`]: the [`SectionExtractor`] capability and response parsing
//! - [`pipeline`]: sequential chunk extraction with delay and retries
//! - [`storage`]: `<slug>.json` / `<slug>.raw.txt` artifacts
//! - [`cli`]: the `lawtext` command

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod extraction;
pub mod pdf;
pub mod pipeline;
pub mod prompt;
pub mod storage;

pub use client::{AnthropicClient, LlmClient, LlmRequest, LlmResponse, Message, Role};
#[cfg(any(test, feature = "test-utils"))]
pub use client::test_support::MockLlmClient;
pub use config::ExtractorConfig;
pub use error::{ExtractorError, Result};
pub use extraction::{parse_chunk_response, ChunkRequest, LlmSectionExtractor, SectionExtractor};
pub use pipeline::ExtractionPipeline;
