// Catalogue and practice-history records
//
// `New*` structs are request bodies; the others are what the store returns.
// Password hashes never leave the store.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub skill_level: Option<String>,
    /// Names of the instruments the user plays
    pub instruments: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub skill_level: Option<String>,
    #[serde(default)]
    pub instrument_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instrument {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInstrument {
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub lesson_type: Option<String>,
    pub instrument_id: Option<i64>,
    pub difficulty: Option<String>,
    pub content: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLesson {
    pub title: String,
    #[serde(default)]
    pub lesson_type: Option<String>,
    #[serde(default)]
    pub instrument_id: Option<i64>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSong {
    pub title: String,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeSession {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: Option<i64>,
    pub song_id: Option<i64>,
    pub duration_minutes: u32,
    pub feedback: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPracticeSession {
    #[serde(default)]
    pub lesson_id: Option<i64>,
    #[serde(default)]
    pub song_id: Option<i64>,
    pub duration_minutes: u32,
    #[serde(default)]
    pub feedback: Option<String>,
}
