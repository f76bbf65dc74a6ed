// Request bodies for the /ai endpoints
//
// Bodies are parsed leniently (missing optional fields take defaults) and
// then validated into a `GenerationRequest`.

use axum::extract::FromRequest;
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::generation::{GenerationRequest, Instrument, PracticeSessionSummary, SongQuery};

/// `Json` extractor whose rejections render as `{"detail"}` with 422.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> axum::response::IntoResponse for ApiJson<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}

fn required(field: &str, value: String) -> Result<String, ApiError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ApiError::Unprocessable(format!("{} must not be empty", field)));
    }
    Ok(value)
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongQueryBody {
    #[serde(default)]
    pub song_query: String,
    pub simplify: Option<bool>,
    pub help_practice: Option<bool>,
    pub show_substitutions: Option<bool>,
    pub instrument: Option<Instrument>,
}

impl TryFrom<SongQueryBody> for SongQuery {
    type Error = ApiError;

    fn try_from(body: SongQueryBody) -> Result<Self, ApiError> {
        let defaults = SongQuery::new(required("songQuery", body.song_query)?);
        Ok(SongQuery {
            simplify: body.simplify.unwrap_or(defaults.simplify),
            help_practice: body.help_practice.unwrap_or(defaults.help_practice),
            show_substitutions: body.show_substitutions.unwrap_or(defaults.show_substitutions),
            instrument: body.instrument.unwrap_or(defaults.instrument),
            ..defaults
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackingTrackBody {
    #[serde(default)]
    pub prompt: String,
}

impl TryFrom<BackingTrackBody> for GenerationRequest {
    type Error = ApiError;

    fn try_from(body: BackingTrackBody) -> Result<Self, ApiError> {
        Ok(GenerationRequest::BackingTrack {
            prompt: required("prompt", body.prompt)?,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RhythmBody {
    #[serde(alias = "time_signature")]
    pub time_signature: Option<String>,
    pub level: Option<String>,
}

impl From<RhythmBody> for GenerationRequest {
    fn from(body: RhythmBody) -> Self {
        GenerationRequest::RhythmPattern {
            time_signature: or_default(body.time_signature, "4/4"),
            level: or_default(body.level, "beginner"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MelodyBody {
    pub key: Option<String>,
    pub style: Option<String>,
}

impl From<MelodyBody> for GenerationRequest {
    fn from(body: MelodyBody) -> Self {
        GenerationRequest::Melody {
            key: or_default(body.key, "C major"),
            style: or_default(body.style, "pop"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImprovBody {
    pub query: Option<String>,
}

impl From<ImprovBody> for GenerationRequest {
    fn from(body: ImprovBody) -> Self {
        GenerationRequest::ImprovTips {
            query: or_default(body.query, "How do I start improvising over a blues progression?"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LyricsBody {
    pub topic: Option<String>,
    pub genre: Option<String>,
    pub mood: Option<String>,
}

impl From<LyricsBody> for GenerationRequest {
    fn from(body: LyricsBody) -> Self {
        GenerationRequest::Lyrics {
            topic: or_default(body.topic, "music"),
            genre: or_default(body.genre, "pop"),
            mood: or_default(body.mood, "uplifting"),
        }
    }
}

/// Either inline sessions or a stored user's history.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeAdviceBody {
    pub sessions: Option<Vec<PracticeSessionSummary>>,
    #[serde(alias = "user_id")]
    pub user_id: Option<i64>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonBody {
    #[serde(alias = "skill_level")]
    pub skill_level: Option<String>,
    pub instrument: Option<String>,
    pub focus: Option<String>,
}

impl From<LessonBody> for GenerationRequest {
    fn from(body: LessonBody) -> Self {
        GenerationRequest::Lesson {
            skill_level: or_default(body.skill_level, "beginner"),
            instrument: or_default(body.instrument, "guitar"),
            focus: or_default(body.focus, "fundamentals"),
        }
    }
}
