//! Sequential extraction pipeline: chunk, extract with retries, merge.

use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use tracing::{info, warn};

use lawtext_core::chunker::chunk_document;
use lawtext_core::merger::{merge_chunk_results, MergeOptions};
use lawtext_core::types::{ChunkExtractionResult, ExtractedLaw, RawDocument, TextChunk};

use crate::config::ExtractorConfig;
use crate::error::{ExtractorError, Result};
use crate::extraction::{ChunkRequest, SectionExtractor};

/// Drives one document through chunking, extraction and merging.
///
/// Chunks are sent one at a time in index order with a fixed pause between
/// requests. Transient failures are retried with exponential backoff; any
/// other failure aborts the document.
pub struct ExtractionPipeline<'a, E: SectionExtractor> {
    extractor: &'a E,
    config: &'a ExtractorConfig,
    progress: Option<ProgressBar>,
}

impl<'a, E: SectionExtractor> ExtractionPipeline<'a, E> {
    pub fn new(extractor: &'a E, config: &'a ExtractorConfig) -> Self {
        Self {
            extractor,
            config,
            progress: None,
        }
    }

    /// Report per-chunk progress on a spinner.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Extract a document into a merged law.
    ///
    /// `options` supplies the file name, slug and category; document size,
    /// model and timing are filled in here.
    pub async fn extract_document(
        &self,
        document: &RawDocument,
        options: MergeOptions,
    ) -> Result<ExtractedLaw> {
        let started = Instant::now();
        let chunks = chunk_document(document, &self.config.chunking)?;
        let filename = options.filename.clone();

        info!(
            file = %filename,
            chunks = chunks.len(),
            bytes = document.text.len(),
            "starting extraction"
        );

        let mut results: Vec<ChunkExtractionResult> = Vec::with_capacity(chunks.len());
        let mut next_order_index = 0;

        for chunk in &chunks {
            if chunk.index > 0 && self.config.request_delay_ms > 0 {
                tokio::time::sleep(self.config.request_delay()).await;
            }
            if let Some(progress) = &self.progress {
                progress.set_message(format!(
                    "Extracting chunk {}/{}...",
                    chunk.index + 1,
                    chunks.len()
                ));
            }

            let request = chunk_request(chunk, &filename, chunks.len(), next_order_index);
            let result = self.extract_with_retry(&request).await?;

            info!(
                chunk = chunk.index,
                sections = result.sections.len(),
                confidence = result.confidence,
                "chunk extracted"
            );
            next_order_index += result.sections.len();
            results.push(result);
        }

        let mut options = options
            .with_document(document)
            .with_processing_time_ms(started.elapsed().as_millis() as u64);
        if let Some(model) = self.extractor.model() {
            options = options.with_model(model);
        }

        Ok(merge_chunk_results(&results, &options))
    }

    /// Extract one chunk, retrying transient failures.
    async fn extract_with_retry(&self, request: &ChunkRequest) -> Result<ChunkExtractionResult> {
        let max_attempts = self.config.max_retries + 1;
        let mut attempt = 1;

        loop {
            let error = match self.extractor.extract(request).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_transient() => e,
                Err(e) => return Err(e),
            };

            if attempt >= max_attempts {
                return Err(ExtractorError::RetriesExhausted {
                    chunk_index: request.chunk_index,
                    attempts: attempt,
                    message: error.to_string(),
                });
            }

            // Use the server-provided retry-after, at least as long as the backoff
            let delay = error
                .retry_after_secs()
                .map(Duration::from_secs)
                .unwrap_or_default()
                .max(self.config.retry_delay(attempt));
            warn!(
                chunk = request.chunk_index,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "transient extraction failure, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn chunk_request(
    chunk: &TextChunk,
    filename: &str,
    total_chunks: usize,
    starting_order_index: usize,
) -> ChunkRequest {
    ChunkRequest {
        chunk_text: chunk.text.clone(),
        filename: filename.to_string(),
        chunk_index: chunk.index,
        total_chunks,
        starting_order_index,
    }
}
