// Catalogue and practice-history endpoints

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;

use super::error::ApiError;
use super::types::ApiJson;
use super::AppState;
use crate::store::{
    Instrument, Lesson, NewInstrument, NewLesson, NewPracticeSession, NewSong, NewUser,
    PracticeSession, Song, User,
};

type Created<T> = (StatusCode, Json<T>);

fn not_blank(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Unprocessable(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.store.list_users().await?))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<Created<User>, ApiError> {
    not_blank("name", &body.name)?;
    if !body.email.contains('@') {
        return Err(ApiError::Unprocessable("email is not valid".to_string()));
    }
    if body.password.len() < 6 {
        return Err(ApiError::Unprocessable(
            "password must be at least 6 characters".to_string(),
        ));
    }
    let user = state.store.create_user(body).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    state
        .store
        .get_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", id)))
}

pub async fn list_instruments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Instrument>>, ApiError> {
    Ok(Json(state.store.list_instruments().await?))
}

pub async fn create_instrument(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewInstrument>,
) -> Result<Created<Instrument>, ApiError> {
    not_blank("name", &body.name)?;
    let instrument = state.store.create_instrument(body).await?;
    Ok((StatusCode::CREATED, Json(instrument)))
}

pub async fn list_lessons(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Lesson>>, ApiError> {
    Ok(Json(state.store.list_lessons().await?))
}

pub async fn create_lesson(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewLesson>,
) -> Result<Created<Lesson>, ApiError> {
    not_blank("title", &body.title)?;
    let lesson = state.store.create_lesson(body).await?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

pub async fn list_songs(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Song>>, ApiError> {
    Ok(Json(state.store.list_songs().await?))
}

pub async fn create_song(
    State(state): State<Arc<AppState>>,
    ApiJson(body): ApiJson<NewSong>,
) -> Result<Created<Song>, ApiError> {
    not_blank("title", &body.title)?;
    let song = state.store.create_song(body).await?;
    Ok((StatusCode::CREATED, Json(song)))
}

pub async fn get_song(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Song>, ApiError> {
    state
        .store
        .get_song(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("song {} not found", id)))
}

pub async fn list_practice_sessions(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<PracticeSession>>, ApiError> {
    state
        .store
        .list_practice_sessions(user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("user {} not found", user_id)))
}

pub async fn create_practice_session(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    ApiJson(body): ApiJson<NewPracticeSession>,
) -> Result<Created<PracticeSession>, ApiError> {
    if body.duration_minutes == 0 {
        return Err(ApiError::Unprocessable(
            "duration_minutes must be positive".to_string(),
        ));
    }
    let session = state.store.create_practice_session(user_id, body).await?;
    Ok((StatusCode::CREATED, Json(session)))
}
