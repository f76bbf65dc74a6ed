// Google Gemini API provider implementation
//
// Single-turn generateContent calls. The API key travels as a query
// parameter, so request URLs are never logged.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::retry::{AttemptError, RetryPolicy};
use super::{build_client, read_json, CallOptions, GenerationProvider, PROBE_PROMPT};
use crate::config::constants::{GEMINI_BASE_URL, GEMINI_DEFAULT_MODEL};
use crate::config::ProviderSettings;
use crate::errors::ProviderError;

const PROVIDER_NAME: &str = "gemini";

/// Google Gemini API provider
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

impl GeminiProvider {
    pub fn new(settings: &ProviderSettings, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout_secs)?,
            api_key: settings.key().map(str::to_string),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| GEMINI_DEFAULT_MODEL.to_string()),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| GEMINI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            retry,
        })
    }

    fn to_gemini_request(prompt: &str, options: &CallOptions) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_tokens,
                top_p: options.top_p,
                response_mime_type: options
                    .json_mode
                    .then(|| "application/json".to_string()),
            },
        }
    }

    /// Concatenated text of the first candidate.
    fn response_text(response: GeminiResponse) -> Result<String, AttemptError> {
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AttemptError::new("Gemini returned no candidates in response"))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AttemptError::new(format!(
                "Gemini returned an empty response (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        Ok(text)
    }

    async fn send(
        &self,
        prompt: &str,
        options: &CallOptions,
        policy: &RetryPolicy,
    ) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured {
                provider: PROVIDER_NAME.to_string(),
            })?;
        let request = Self::to_gemini_request(prompt, options);

        policy
            .run(PROVIDER_NAME, || self.call_once(api_key, &request))
            .await
    }

    async fn call_once(
        &self,
        api_key: &str,
        request: &GeminiRequest,
    ) -> Result<String, AttemptError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        tracing::debug!(provider = PROVIDER_NAME, model = %self.model, "Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await;

        let body: GeminiResponse = read_json(PROVIDER_NAME, response).await?;
        Self::response_text(body)
    }
}

#[async_trait]
impl GenerationProvider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn call(&self, prompt: &str, options: &CallOptions) -> Result<String, ProviderError> {
        self.send(prompt, options, &self.retry).await
    }

    /// One attempt only; a slow or failing vendor must not stall startup.
    async fn probe(&self) -> Result<(), ProviderError> {
        self.send(PROBE_PROMPT, &CallOptions::probe(), &RetryPolicy::immediate(0))
            .await
            .map(|_| ())
    }
}

// Gemini API types

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}
