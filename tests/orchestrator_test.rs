// End-to-end fallback through real HTTP provider clients
//
// Gemini and Grok point at two local mockito servers; the registry is
// built from config exactly as the binary builds it.

use mockito::Matcher;
use serde_json::json;

use riffwise::config::Config;
use riffwise::generation::{FallbackOrchestrator, GenerationRequest, SongQuery};
use riffwise::providers::{CallOptions, ProviderRegistry};
use riffwise::{CanonicalResult, GenerationError};

const PROGRESSION: &str = r#"{"songTitle":"Imagine","artist":"John Lennon","key":"C Major","progression":[{"chord":"C","duration":4},{"chord":"Cmaj7","duration":4},{"chord":"F","duration":8}],"practiceTips":["Let the F ring"]}"#;

fn config_for(gemini_url: String, grok_url: String) -> Config {
    let mut config = Config::default();
    config.providers.probe_on_startup = false;
    config.providers.gemini.api_key = Some("g-key".to_string());
    config.providers.gemini.base_url = Some(gemini_url);
    config.providers.grok.api_key = Some("xai-key".to_string());
    config.providers.grok.base_url = Some(grok_url);
    config.retry.max_retries = 1;
    config.retry.base_delay_ms = 1;
    config.retry.max_delay_ms = 5;
    config
}

async fn orchestrator(config: &Config) -> FallbackOrchestrator {
    let registry = ProviderRegistry::initialize(config).await.unwrap();
    FallbackOrchestrator::new(registry.into(), CallOptions::from(&config.generation))
}

#[tokio::test]
async fn test_gemini_outage_falls_back_to_grok() {
    let mut gemini = mockito::Server::new_async().await;
    let mut grok = mockito::Server::new_async().await;

    let gemini_mock = gemini
        .mock("POST", Matcher::Regex(r":generateContent$".to_string()))
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("overloaded")
        .expect(2)
        .create_async()
        .await;
    let grok_mock = grok
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{"message": {"role": "assistant", "content": format!("```json\n{}\n```", PROGRESSION)}, "finish_reason": "stop"}]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let config = config_for(gemini.url(), grok.url());
    let result = orchestrator(&config)
        .await
        .generate(&GenerationRequest::ChordProgression(SongQuery::new("Imagine")))
        .await
        .unwrap();

    match result {
        CanonicalResult::ChordProgression(p) => {
            assert_eq!(p.artist, "John Lennon");
            assert_eq!(p.progression.len(), 3);
            assert_eq!(p.progression[2].duration, 8);
            assert_eq!(p.practice_tips, vec!["Let the F ring"]);
            assert!(p.substitutions.is_empty());
        }
        other => panic!("unexpected result: {:?}", other),
    }
    gemini_mock.assert_async().await;
    grok_mock.assert_async().await;
}

#[tokio::test]
async fn test_primary_success_skips_secondary() {
    let mut gemini = mockito::Server::new_async().await;
    let mut grok = mockito::Server::new_async().await;

    let gemini_mock = gemini
        .mock("POST", Matcher::Regex(r":generateContent$".to_string()))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": PROGRESSION}]}, "finishReason": "STOP"}]
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let grok_mock = grok
        .mock("POST", "/v1/chat/completions")
        .expect(0)
        .create_async()
        .await;

    let config = config_for(gemini.url(), grok.url());
    let result = orchestrator(&config)
        .await
        .generate(&GenerationRequest::ChordProgression(SongQuery::new("Imagine")))
        .await;

    assert!(result.is_ok());
    gemini_mock.assert_async().await;
    grok_mock.assert_async().await;
}

#[tokio::test]
async fn test_both_malformed_is_all_providers_unavailable() {
    let mut gemini = mockito::Server::new_async().await;
    let mut grok = mockito::Server::new_async().await;

    gemini
        .mock("POST", Matcher::Regex(r":generateContent$".to_string()))
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Sorry, I don't know that song."}]}}]
            })
            .to_string(),
        )
        .create_async()
        .await;
    grok.mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"songTitle\": \"Imagine\", }"}}]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let config = config_for(gemini.url(), grok.url());
    let err = orchestrator(&config)
        .await
        .generate(&GenerationRequest::ChordProgression(SongQuery::new("Imagine")))
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::AllProvidersUnavailable { .. }));
    let providers: Vec<_> = err.failures().iter().map(|f| f.provider.as_str()).collect();
    assert_eq!(providers, vec!["gemini", "grok"]);
}

#[tokio::test]
async fn test_failed_probe_removes_provider_from_rotation() {
    let mut gemini = mockito::Server::new_async().await;
    let mut grok = mockito::Server::new_async().await;

    gemini
        .mock("POST", Matcher::Regex(r":generateContent$".to_string()))
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body("API key not valid")
        .create_async()
        .await;
    grok.mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"choices": [{"message": {"role": "assistant", "content": "Hello"}}]}).to_string(),
        )
        .create_async()
        .await;

    let mut config = config_for(gemini.url(), grok.url());
    config.providers.probe_on_startup = true;
    let registry = ProviderRegistry::initialize(&config).await.unwrap();

    let status = registry.status();
    assert_eq!(status[0].name, "gemini");
    assert!(!status[0].available);
    assert!(status[1].available);
    assert_eq!(registry.available_count(), 1);
}
