// xAI Grok API provider implementation
//
// Grok speaks the OpenAI chat completions format.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::retry::{AttemptError, RetryPolicy};
use super::{build_client, read_json, CallOptions, GenerationProvider, PROBE_PROMPT};
use crate::config::constants::{GROK_BASE_URL, GROK_DEFAULT_MODEL};
use crate::config::ProviderSettings;
use crate::errors::ProviderError;

const PROVIDER_NAME: &str = "grok";

const SYSTEM_PROMPT: &str =
    "You are a music theory expert and teacher. Follow the requested JSON structure exactly.";

#[derive(Clone)]
pub struct GrokProvider {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    retry: RetryPolicy,
}

impl GrokProvider {
    pub fn new(settings: &ProviderSettings, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            client: build_client(settings.timeout_secs)?,
            api_key: settings.key().map(str::to_string),
            model: settings
                .model
                .clone()
                .unwrap_or_else(|| GROK_DEFAULT_MODEL.to_string()),
            base_url: settings
                .base_url
                .clone()
                .unwrap_or_else(|| GROK_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            retry,
        })
    }

    fn to_chat_request(&self, prompt: &str, options: &CallOptions) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            response_format: options.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        }
    }

    fn response_text(response: ChatResponse) -> Result<String, AttemptError> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AttemptError::new("Grok returned no choices in response"))?;

        match choice.message.and_then(|m| m.content) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AttemptError::new(format!(
                "Grok returned an empty response (finish reason: {})",
                choice.finish_reason.as_deref().unwrap_or("unknown")
            ))),
        }
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
        let request = self.to_chat_request(prompt, options);

        policy
            .run(PROVIDER_NAME, || self.call_once(api_key, &request))
            .await
    }

    async fn call_once(&self, api_key: &str, request: &ChatRequest) -> Result<String, AttemptError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        tracing::debug!(provider = PROVIDER_NAME, model = %self.model, "Sending request to Grok API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await;

        let body: ChatResponse = read_json(PROVIDER_NAME, response).await?;
        Self::response_text(body)
    }
}

#[async_trait]
impl GenerationProvider for GrokProvider {
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

// OpenAI-compatible API types

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: Option<ChatResponseMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> GrokProvider {
        let settings = ProviderSettings {
            api_key: Some("xai-test".to_string()),
            base_url: Some("http://localhost:1234/".to_string()),
            ..Default::default()
        };
        GrokProvider::new(&settings, RetryPolicy::immediate(0)).unwrap()
    }

    #[test]
    fn test_grok_provider_creation() {
        let p = provider();
        assert_eq!(p.name(), "grok");
        assert_eq!(p.model(), GROK_DEFAULT_MODEL);
        assert_eq!(p.base_url, "http://localhost:1234");
    }

    #[test]
    fn test_chat_request_has_system_and_user_messages() {
        let body = serde_json::to_value(provider().to_chat_request("write a riff", &CallOptions::default())).unwrap();
        assert_eq!(body["model"], GROK_DEFAULT_MODEL);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["messages"][1]["content"], "write a riff");
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_response_text() {
        let ok: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{}"}, "finish_reason": "stop"}]
        }))
        .unwrap();
        assert_eq!(GrokProvider::response_text(ok).unwrap(), "{}");

        let empty: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}, "finish_reason": "length"}]
        }))
        .unwrap();
        assert!(GrokProvider::response_text(empty).unwrap_err().reason.contains("length"));

        let none: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(GrokProvider::response_text(none).is_err());
    }
}
