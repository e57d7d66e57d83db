//! OpenAI-compatible chat-completions generator.
//!
//! Works against any endpoint speaking the `/chat/completions` protocol.
//! Transient failures (HTTP 429 and 5xx, connection errors) are retried with
//! exponential backoff; permanent errors (bad API key, 400) surface
//! immediately.

use super::{GenerationReply, GenerationRequest, Generator};
use crate::errors::GenerationError;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for [`OpenAiGenerator`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Bearer token for the API.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible endpoint.
    pub api_base: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature. Low values keep answers faithful to the source.
    pub temperature: f32,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Retry attempts on transient failures.
    pub max_retries: u32,
    /// Initial backoff delay in milliseconds; doubles per attempt.
    pub retry_backoff_ms: u64,
}

impl OpenAiConfig {
    /// Creates a config with the given API key and default settings.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.2,
            max_tokens: 1024,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }

    /// Builds a config from the environment.
    ///
    /// Requires `OPENAI_API_KEY`; honors `OPENAI_BASE_URL` and
    /// `DOCFLOW_MODEL` overrides.
    pub fn from_env() -> Result<Self, GenerationError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| GenerationError::missing_credentials("OPENAI_API_KEY"))?;

        let mut config = Self::new(api_key);
        if let Ok(base) = env::var("OPENAI_BASE_URL") {
            config.api_base = base;
        }
        if let Ok(model) = env::var("DOCFLOW_MODEL") {
            config.model = model;
        }
        Ok(config)
    }

    /// Sets the endpoint base URL.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the model identifier.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the retry attempt bound.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Generator backed by an OpenAI-compatible chat-completions endpoint.
#[derive(Debug)]
pub struct OpenAiGenerator {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    /// Creates a generator from the given config.
    #[must_use]
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Creates a generator from the environment.
    pub fn from_env() -> Result<Self, GenerationError> {
        Ok(Self::new(OpenAiConfig::from_env()?))
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &request.input,
                },
            ],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        }
    }

    async fn call_once(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationReply, GenerationError> {
        let start = Instant::now();
        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| GenerationError::provider(e.to_string(), true))?;

        let status = response.status();
        if !status.is_success() {
            let retryable = status.as_u16() == 429 || status.is_server_error();
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<unreadable body>"));
            return Err(GenerationError::provider(
                format!("HTTP {status}: {detail}"),
                retryable,
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::malformed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GenerationError::malformed("response carried no message content"))?;

        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            stage = %request.stage,
            model = %self.config.model,
            latency_ms,
            "generation call completed"
        );

        Ok(GenerationReply {
            content,
            input_tokens: parsed.usage.as_ref().and_then(|u| u.prompt_tokens),
            output_tokens: parsed.usage.as_ref().and_then(|u| u.completion_tokens),
            latency_ms: Some(latency_ms),
        })
    }
}

#[async_trait::async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationReply, GenerationError> {
        let mut last_err: Option<GenerationError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    stage = %request.stage,
                    attempt,
                    max = self.config.max_retries,
                    backoff_ms = backoff,
                    "retrying generation call"
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.call_once(&request).await {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_retryable() => last_err = Some(err),
                Err(err) => return Err(err),
            }
        }

        Err(last_err
            .unwrap_or_else(|| GenerationError::provider("retries exhausted", false)))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}
