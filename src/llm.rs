//! Synchronous text-generation client over the Anthropic Messages API.
//!
//! Calls block until the provider answers: no retries, no explicit timeout,
//! one request in flight at a time. A failed call is reported and only
//! re-triggered by explicit caller action; a caller that needs
//! responsiveness wraps the call with its own timeout.

use serde::Deserialize;
use thiserror::Error;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-sonnet-20240229";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
/// Optional environment override for the model id.
pub const MODEL_ENV: &str = "DEALDESK_MODEL";

/// Transport-level failures from the text-generation call. Unusable response
/// *content* is a separate concern (`AnalysisError`).
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("ANTHROPIC_API_KEY is not set")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("response carried no text content")]
    EmptyResponse,
}

/// Seam between the analysis workflows and the model provider.
///
/// Implementations take a finished prompt and return the raw completion
/// text; tests substitute a scripted implementation.
pub trait TextGenerator {
    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError>;
}

/// Messages-API client. Constructed once at startup and injected into the
/// workflows; no global singleton.
pub struct AnthropicClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Read the API key (and optional model override) from the environment.
    pub fn from_env() -> Result<Self, LlmError> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| LlmError::MissingApiKey)?;
        let model = std::env::var(MODEL_ENV).unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(api_key, model))
    }
}

impl TextGenerator for AnthropicClient {
    fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, LlmError> {
        #[derive(Deserialize)]
        struct MessagesResponse {
            content: Vec<ContentBlock>,
        }
        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(default)]
            text: Option<String>,
        }

        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MessagesResponse = resp.json()?;
        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .filter(|text| !text.is_empty())
            .ok_or(LlmError::EmptyResponse)
    }
}
