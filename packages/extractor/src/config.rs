//! Extractor configuration from the environment, with a builder for tests.

use std::time::Duration;

use lawtext_core::config::{ChunkingConfig, DEFAULT_MAX_CHUNK_SIZE, DEFAULT_OVERLAP_SIZE};

use crate::error::{ExtractorError, Result};

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";
pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";

/// Configuration for LLM-based section extraction.
#[derive(Clone)]
pub struct ExtractorConfig {
    pub model: String,
    pub api_key: String,
    pub api_base_url: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
    /// Retries per chunk after the first attempt, for transient failures only.
    pub max_retries: u32,
    /// Pause between consecutive chunk requests.
    pub request_delay_ms: u64,
    /// Base delay of the exponential retry backoff.
    pub retry_base_delay_ms: u64,
    pub chunking: ChunkingConfig,
}

impl std::fmt::Debug for ExtractorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorConfig")
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("request_delay_ms", &self.request_delay_ms)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("chunking", &self.chunking)
            .finish()
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ExtractorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("LLM_API_KEY")
            .map_err(|_| ExtractorError::Config("LLM_API_KEY not set".into()))?;

        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        let api_base_url =
            std::env::var("LLM_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.into());

        let chunking = ChunkingConfig {
            max_chunk_size: env_or("CHUNK_MAX_SIZE", DEFAULT_MAX_CHUNK_SIZE),
            overlap_size: env_or("CHUNK_OVERLAP", DEFAULT_OVERLAP_SIZE),
        };
        if chunking.max_chunk_size == 0 {
            return Err(ExtractorError::Config(
                "CHUNK_MAX_SIZE must be greater than zero".into(),
            ));
        }

        Ok(Self {
            model,
            api_key,
            api_base_url,
            max_tokens: env_or("LLM_MAX_TOKENS", 16_000),
            temperature: env_or("LLM_TEMPERATURE", 0.0),
            timeout_secs: env_or("LLM_TIMEOUT_SECS", 300),
            max_retries: env_or("LLM_MAX_RETRIES", 3),
            request_delay_ms: env_or("LLM_REQUEST_DELAY_MS", 1_000),
            retry_base_delay_ms: 2_000,
            chunking,
        })
    }

    /// Create a config builder for testing.
    pub fn builder(api_key: impl Into<String>) -> ExtractorConfigBuilder {
        ExtractorConfigBuilder {
            config: Self {
                model: DEFAULT_MODEL.into(),
                api_key: api_key.into(),
                api_base_url: DEFAULT_API_BASE_URL.into(),
                max_tokens: 16_000,
                temperature: 0.0,
                timeout_secs: 300,
                max_retries: 3,
                request_delay_ms: 1_000,
                retry_base_delay_ms: 2_000,
                chunking: ChunkingConfig::default(),
            },
        }
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Backoff before retry `attempt` (1-based): base * 2^(attempt-1).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(self.retry_base_delay_ms.saturating_mul(factor))
    }
}

/// Builder for constructing `ExtractorConfig` in tests.
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.config.api_base_url = api_base_url.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f64) -> Self {
        self.config.temperature = temperature;
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    pub fn request_delay_ms(mut self, request_delay_ms: u64) -> Self {
        self.config.request_delay_ms = request_delay_ms;
        self
    }

    pub fn retry_base_delay_ms(mut self, retry_base_delay_ms: u64) -> Self {
        self.config.retry_base_delay_ms = retry_base_delay_ms;
        self
    }

    pub fn chunking(mut self, max_chunk_size: usize, overlap_size: usize) -> Self {
        self.config.chunking = ChunkingConfig {
            max_chunk_size,
            overlap_size,
        };
        self
    }

    pub fn build(self) -> ExtractorConfig {
        self.config
    }
}
