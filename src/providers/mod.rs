// Generation providers
//
// Gemini and Grok behind one trait. A provider turns a prompt into raw
// model text; extraction and validation happen in the orchestrator.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::GenerationSettings;
use crate::errors::ProviderError;

pub mod gemini;
pub mod grok;
pub mod registry;
pub mod retry;

pub use gemini::GeminiProvider;
pub use grok::GrokProvider;
pub use registry::{ProviderRegistry, ProviderStatus};
pub use retry::{AttemptError, RetryPolicy};

/// Prompt used by the startup availability probe.
pub const PROBE_PROMPT: &str = "Say 'Hello' in one word.";

/// Sampling options for one call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    /// Ask the provider for a JSON-only response when it supports it
    pub json_mode: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self::from(&GenerationSettings::default())
    }
}

impl From<&GenerationSettings> for CallOptions {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            top_p: settings.top_p,
            json_mode: true,
        }
    }
}

impl CallOptions {
    /// Options for the startup probe: plain text, tiny output.
    pub fn probe() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: 16,
            top_p: 1.0,
            json_mode: false,
        }
    }
}

/// A remote text-generation service.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Provider name used in config and logs ("gemini", "grok")
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Whether credentials are present
    fn is_configured(&self) -> bool;

    /// Send `prompt` and return the model's raw text, retrying per the
    /// provider's policy. Never returns empty text.
    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String, ProviderError>;

    /// Cheap liveness check used at startup. Real clients override this to
    /// make exactly one attempt.
    async fn probe(&self) -> Result<(), ProviderError> {
        self.call(PROBE_PROMPT, &CallOptions::probe()).await.map(|_| ())
    }
}

/// Turn an HTTP response into a decoded body or a retryable attempt error.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: &str,
    response: reqwest::Result<Response>,
) -> Result<T, AttemptError> {
    let response = response
        .map_err(|e| AttemptError::new(format!("{} request failed: {}", provider, e)))?;
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = retry_after(&response);
        return Err(AttemptError::rate_limited(
            format!("{} API rate limited (429)", provider),
            retry_after,
        ));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AttemptError::new(format!(
            "{} API returned {}: {}",
            provider,
            status,
            truncate(&body, 200)
        )));
    }

    response
        .json::<T>()
        .await
        .map_err(|e| AttemptError::new(format!("Failed to parse {} API response: {}", provider, e)))
}

/// Seconds-valued Retry-After header.
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub(crate) fn build_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    use anyhow::Context;

    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }

    #[test]
    fn test_call_options_follow_settings() {
        let settings = GenerationSettings {
            temperature: 0.3,
            max_tokens: 512,
            top_p: 0.8,
        };
        let options = CallOptions::from(&settings);
        assert_eq!(options.temperature, 0.3);
        assert_eq!(options.max_tokens, 512);
        assert!(options.json_mode);
        assert!(!CallOptions::probe().json_mode);
    }
}
