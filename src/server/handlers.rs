// Generation and health endpoints

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use super::error::ApiError;
use super::types::{
    ApiJson, BackingTrackBody, ImprovBody, LessonBody, LyricsBody, MelodyBody,
    PracticeAdviceBody, RhythmBody, SongQueryBody,
};
use super::AppState;
use crate::generation::{CanonicalResult, GenerationRequest, SongQuery};
use crate::providers::ProviderStatus;

/// Sessions loaded for `{userId}` practice advice when no limit is given.
const DEFAULT_HISTORY_LIMIT: u32 = 10;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub providers: Vec<ProviderStatus>,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Riffwise API is running!",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Healthy while at least one provider is available.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let registry = state.orchestrator.registry();
    let status = if registry.available_count() > 0 {
        "healthy"
    } else {
        "degraded"
    };
    Json(HealthResponse {
        status,
        providers: registry.status(),
    })
}

async fn run(state: &AppState, request: GenerationRequest) -> Result<Json<CanonicalResult>, ApiError> {
    let task = request.task();
    match tokio::time::timeout(state.request_timeout, state.orchestrator.generate(&request)).await {
        Ok(Ok(result)) => Ok(Json(result)),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => {
            tracing::warn!(task = %task, timeout = ?state.request_timeout, "Generation deadline expired");
            Err(ApiError::Timeout(format!(
                "{} generation timed out after {}s",
                task,
                state.request_timeout.as_secs()
            )))
        }
    }
}

pub async fn song_arrangement(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SongQueryBody>,
) -> Result<Json<CanonicalResult>, ApiError> {
    let query = SongQuery::try_from(body)?;
    run(&state, GenerationRequest::SongArrangement(query)).await
}

pub async fn chord_progression(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<SongQueryBody>,
) -> Result<Json<CanonicalResult>, ApiError> {
    let query = SongQuery::try_from(body)?;
    run(&state, GenerationRequest::ChordProgression(query)).await
}

pub async fn backing_track(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<BackingTrackBody>,
) -> Result<Json<CanonicalResult>, ApiError> {
    run(&state, GenerationRequest::try_from(body)?).await
}

pub async fn rhythm(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<RhythmBody>,
) -> Result<Json<CanonicalResult>, ApiError> {
    run(&state, body.into()).await
}

pub async fn melody(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<MelodyBody>,
) -> Result<Json<CanonicalResult>, ApiError> {
    run(&state, body.into()).await
}

pub async fn improv(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<ImprovBody>,
) -> Result<Json<CanonicalResult>, ApiError> {
    run(&state, body.into()).await
}

pub async fn lyrics(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LyricsBody>,
) -> Result<Json<CanonicalResult>, ApiError> {
    run(&state, body.into()).await
}

pub async fn practice_advice(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<PracticeAdviceBody>,
) -> Result<Json<CanonicalResult>, ApiError> {
    let sessions = match (body.sessions, body.user_id) {
        (Some(sessions), _) => sessions,
        (None, Some(user_id)) => {
            let limit = body.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
            state
                .store
                .practice_history(user_id, limit)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("user {} not found", user_id)))?
        }
        (None, None) => {
            return Err(ApiError::Unprocessable(
                "provide either sessions or userId".to_string(),
            ))
        }
    };
    run(&state, GenerationRequest::PracticeAdvice { sessions }).await
}

pub async fn lesson(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<LessonBody>,
) -> Result<Json<CanonicalResult>, ApiError> {
    run(&state, body.into()).await
}
