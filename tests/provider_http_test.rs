// Provider clients against a local HTTP double
//
// Each test runs its own mockito server; retry delays are a few
// milliseconds so exhaustion paths finish quickly.

use mockito::Matcher;
use serde_json::json;
use std::time::Duration;

use riffwise::config::ProviderSettings;
use riffwise::providers::{
    CallOptions, GeminiProvider, GenerationProvider, GrokProvider, RetryPolicy,
};
use riffwise::ProviderError;

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

fn settings(url: String, key: &str) -> ProviderSettings {
    ProviderSettings {
        api_key: Some(key.to_string()),
        base_url: Some(url),
        timeout_secs: 5,
        ..Default::default()
    }
}

fn gemini_body(text: &str) -> String {
    json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

fn grok_body(text: &str) -> String {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

#[tokio::test]
async fn test_gemini_returns_candidate_text() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(r"^/models/gemini-2\.0-flash:generateContent$".to_string()))
        .match_query(Matcher::UrlEncoded("key".to_string(), "g-key".to_string()))
        .match_body(Matcher::PartialJson(json!({
            "contents": [{"role": "user", "parts": [{"text": "write chords"}]}],
            "generationConfig": {"maxOutputTokens": 2048, "responseMimeType": "application/json"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body("{\"lyrics\":\"la la\"}"))
        .expect(1)
        .create_async()
        .await;

    let provider = GeminiProvider::new(&settings(server.url(), "g-key"), fast_retry(2)).unwrap();
    let text = provider.call("write chords", &CallOptions::default()).await.unwrap();

    assert_eq!(text, "{\"lyrics\":\"la la\"}");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_server_error_exhausts_retries() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(r":generateContent$".to_string()))
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("internal error")
        .expect(3)
        .create_async()
        .await;

    let provider = GeminiProvider::new(&settings(server.url(), "g-key"), fast_retry(2)).unwrap();
    let err = provider.call("hi", &CallOptions::default()).await.unwrap_err();

    match err {
        ProviderError::ProviderUnavailable {
            provider,
            attempts,
            reason,
        } => {
            assert_eq!(provider, "gemini");
            assert_eq!(attempts, 3);
            assert!(reason.contains("500"), "reason was: {}", reason);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_empty_text_is_retried() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(r":generateContent$".to_string()))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(gemini_body("   "))
        .expect(2)
        .create_async()
        .await;

    let provider = GeminiProvider::new(&settings(server.url(), "g-key"), fast_retry(1)).unwrap();
    let err = provider.call("hi", &CallOptions::default()).await.unwrap_err();

    assert!(err.to_string().contains("empty response"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_grok_sends_bearer_and_returns_message() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer xai-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "grok-2-latest",
            "max_tokens": 2048,
            "response_format": {"type": "json_object"}
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(grok_body("{\"pattern\":\"D-DU-UDU\"}"))
        .expect(1)
        .create_async()
        .await;

    let provider = GrokProvider::new(&settings(server.url(), "xai-key"), fast_retry(2)).unwrap();
    let text = provider.call("strum", &CallOptions::default()).await.unwrap();

    assert_eq!(text, "{\"pattern\":\"D-DU-UDU\"}");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_grok_rate_limit_is_retried_within_cap() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(429)
        .with_header("retry-after", "30")
        .expect(3)
        .create_async()
        .await;

    let provider = GrokProvider::new(&settings(server.url(), "xai-key"), fast_retry(2)).unwrap();
    let started = std::time::Instant::now();
    let err = provider.call("strum", &CallOptions::default()).await.unwrap_err();

    // Retry-After of 30s is capped at max_delay
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(err.to_string().contains("429"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_grok_probe_succeeds() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_body(Matcher::PartialJson(json!({"max_tokens": 16})))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(grok_body("Hello"))
        .expect(1)
        .create_async()
        .await;

    let provider = GrokProvider::new(&settings(server.url(), "xai-key"), fast_retry(0)).unwrap();
    provider.probe().await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_grok_liveness_check_is_single_attempt() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("internal error")
        .expect(1)
        .create_async()
        .await;

    let provider = GrokProvider::new(&settings(server.url(), "xai-key"), fast_retry(2)).unwrap();
    match provider.probe().await {
        Err(ProviderError::ProviderUnavailable { attempts, .. }) => assert_eq!(attempts, 1),
        other => panic!("unexpected result: {:?}", other),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn test_gemini_liveness_check_is_single_attempt() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", Matcher::Regex(r":generateContent$".to_string()))
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("overloaded")
        .expect(1)
        .create_async()
        .await;

    let provider = GeminiProvider::new(&settings(server.url(), "g-key"), fast_retry(2)).unwrap();
    assert!(provider.probe().await.is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_unconfigured_provider_makes_no_request() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let mut unconfigured = settings(server.url(), "");
    unconfigured.api_key = None;
    let provider = GrokProvider::new(&unconfigured, fast_retry(2)).unwrap();
    let err = provider.call("strum", &CallOptions::default()).await.unwrap_err();

    assert!(matches!(err, ProviderError::NotConfigured { .. }));
    mock.assert_async().await;
}
