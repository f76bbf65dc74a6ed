// Persistence for users, instruments, lessons, songs and practice history
//
// - SQLite with WAL mode
// - One connection behind an async mutex, shared by all handlers
// - Timestamps stored as UTC RFC 3339 text

pub mod models;
pub mod seed;

pub use models::{
    Instrument, Lesson, NewInstrument, NewLesson, NewPracticeSession, NewSong, NewUser,
    PracticeSession, Song, User,
};
pub use seed::seed_demo_data;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::generation::PracticeSessionSummary;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Clone)]
pub struct Store {
    db: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (creating if needed) the database at `path`. `:memory:` opens a
    /// private in-memory database.
    pub fn open(path: &Path) -> Result<Self> {
        if path == Path::new(":memory:") {
            return Self::open_in_memory();
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Self::init(conn)?;
        tracing::info!("Store initialized: {}", path.display());
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(include_str!("schema.sql"))
            .context("Failed to apply database schema")?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    // Users

    pub async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut conn = self.db.lock().await;
        let tx = conn.transaction()?;

        let taken: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![new.email],
            |row| row.get(0),
        )?;
        if taken {
            return Err(StoreError::Conflict(format!(
                "a user with email {} already exists",
                new.email
            )));
        }
        for instrument_id in &new.instrument_ids {
            if !exists(&tx, "instruments", *instrument_id)? {
                return Err(StoreError::NotFound(format!("instrument {}", instrument_id)));
            }
        }

        let now = now();
        tx.execute(
            "INSERT INTO users (name, email, password_hash, skill_level, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![new.name, new.email, hash_password(&new.password), new.skill_level, now],
        )?;
        let id = tx.last_insert_rowid();
        for instrument_id in &new.instrument_ids {
            tx.execute(
                "INSERT OR IGNORE INTO user_instruments (user_id, instrument_id) VALUES (?1, ?2)",
                params![id, instrument_id],
            )?;
        }
        tx.commit()?;

        tracing::debug!(user_id = id, "Created user");
        load_user(&conn, id)?.ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    pub async fn list_users(&self) -> StoreResult<Vec<User>> {
        let conn = self.db.lock().await;
        let ids: Vec<i64> = {
            let mut stmt = conn.prepare("SELECT id FROM users ORDER BY id")?;
            let rows = stmt.query_map([], |row| row.get(0))?;
            rows.collect::<Result<_, _>>()?
        };
        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = load_user(&conn, id)? {
                users.push(user);
            }
        }
        Ok(users)
    }

    pub async fn get_user(&self, id: i64) -> StoreResult<Option<User>> {
        let conn = self.db.lock().await;
        load_user(&conn, id)
    }

    /// Check a password against the stored salted hash.
    #[cfg(test)]
    async fn verify_password(&self, email: &str, password: &str) -> StoreResult<bool> {
        let conn = self.db.lock().await;
        let stored: Option<String> = conn
            .query_row(
                "SELECT password_hash FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        Ok(stored.is_some_and(|hash| password_matches(&hash, password)))
    }

    // Instruments

    pub async fn create_instrument(&self, new: NewInstrument) -> StoreResult<Instrument> {
        let conn = self.db.lock().await;
        conn.execute(
            "INSERT INTO instruments (name, type) VALUES (?1, ?2)",
            params![new.name, new.kind],
        )?;
        Ok(Instrument {
            id: conn.last_insert_rowid(),
            name: new.name,
            kind: new.kind,
        })
    }

    pub async fn list_instruments(&self) -> StoreResult<Vec<Instrument>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare("SELECT id, name, type FROM instruments ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Instrument {
                id: row.get(0)?,
                name: row.get(1)?,
                kind: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // Lessons

    pub async fn create_lesson(&self, new: NewLesson) -> StoreResult<Lesson> {
        let conn = self.db.lock().await;
        if let Some(instrument_id) = new.instrument_id {
            if !exists(&conn, "instruments", instrument_id)? {
                return Err(StoreError::NotFound(format!("instrument {}", instrument_id)));
            }
        }
        let now = now();
        conn.execute(
            "INSERT INTO lessons (title, lesson_type, instrument_id, difficulty, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![new.title, new.lesson_type, new.instrument_id, new.difficulty, new.content, now],
        )?;
        Ok(Lesson {
            id: conn.last_insert_rowid(),
            title: new.title,
            lesson_type: new.lesson_type,
            instrument_id: new.instrument_id,
            difficulty: new.difficulty,
            content: new.content,
            created_at: now.clone(),
            updated_at: now,
        })
    }

    pub async fn list_lessons(&self) -> StoreResult<Vec<Lesson>> {
        let conn = self.db.lock().await;
        let mut stmt = conn.prepare(
            "SELECT id, title, lesson_type, instrument_id, difficulty, content, created_at, updated_at
             FROM lessons ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Lesson {
                id: row.get(0)?,
                title: row.get(1)?,
                lesson_type: row.get(2)?,
                instrument_id: row.get(3)?,
                difficulty: row.get(4)?,
                content: row.get(5)?,
                created_at: row.get(6)?,
                updated_at: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    // Songs

    pub async fn create_song(&self, new: NewSong) -> StoreResult<Song> {
        let conn = self.db.lock().await;
        let now = now();
        conn.execute(
            "INSERT INTO songs (title, artist, genre, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![new.title, new.artist, new.genre, now],
        )?;
        Ok(Song {
            id: conn.last_insert_rowid(),
            title: new.title,
            artist: new.artist,
            genre: new.genre,
            created_at: now,
        })
    }

    pub async fn list_songs(&self) -> StoreResult<Vec<Song>> {
        let conn = self.db.lock().await;
        let mut stmt =
            conn.prepare("SELECT id, title, artist, genre, created_at FROM songs ORDER BY id")?;
        let rows = stmt.query_map([], song_from_row)?;
        Ok(rows.collect::<Result<_, _>>()?)
    }

    pub async fn get_song(&self, id: i64) -> StoreResult<Option<Song>> {
        let conn = self.db.lock().await;
        Ok(conn
            .query_row(
                "SELECT id, title, artist, genre, created_at FROM songs WHERE id = ?1",
                params![id],
                song_from_row,
            )
            .optional()?)
    }

    // Practice sessions

    pub async fn create_practice_session(
        &self,
        user_id: i64,
        new: NewPracticeSession,
    ) -> StoreResult<PracticeSession> {
        let conn = self.db.lock().await;
        if !exists(&conn, "users", user_id)? {
            return Err(StoreError::NotFound(format!("user {}", user_id)));
        }
        if let Some(lesson_id) = new.lesson_id {
            if !exists(&conn, "lessons", lesson_id)? {
                return Err(StoreError::NotFound(format!("lesson {}", lesson_id)));
            }
        }
        if let Some(song_id) = new.song_id {
            if !exists(&conn, "songs", song_id)? {
                return Err(StoreError::NotFound(format!("song {}", song_id)));
            }
        }

        let now = now();
        conn.execute(
            "INSERT INTO practice_sessions (user_id, lesson_id, song_id, duration_minutes, feedback, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![user_id, new.lesson_id, new.song_id, new.duration_minutes, new.feedback, now],
        )?;
        Ok(PracticeSession {
            id: conn.last_insert_rowid(),
            user_id,
            lesson_id: new.lesson_id,
            song_id: new.song_id,
            duration_minutes: new.duration_minutes,
            feedback: new.feedback,
            created_at: now,
        })
    }

    /// Sessions for one user, newest first. `None` if the user does not exist.
    pub async fn list_practice_sessions(
        &self,
        user_id: i64,
    ) -> StoreResult<Option<Vec<PracticeSession>>> {
        let conn = self.db.lock().await;
        if !exists(&conn, "users", user_id)? {
            return Ok(None);
        }
        let mut stmt = conn.prepare(
            "SELECT id, user_id, lesson_id, song_id, duration_minutes, feedback, created_at
             FROM practice_sessions WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok(PracticeSession {
                id: row.get(0)?,
                user_id: row.get(1)?,
                lesson_id: row.get(2)?,
                song_id: row.get(3)?,
                duration_minutes: row.get(4)?,
                feedback: row.get(5)?,
                created_at: row.get(6)?,
            })
        })?;
        Ok(Some(rows.collect::<Result<_, _>>()?))
    }

    /// The user's most recent sessions, summarised for the practice-advice
    /// prompt. `None` if the user does not exist.
    pub async fn practice_history(
        &self,
        user_id: i64,
        limit: u32,
    ) -> StoreResult<Option<Vec<PracticeSessionSummary>>> {
        let conn = self.db.lock().await;
        if !exists(&conn, "users", user_id)? {
            return Ok(None);
        }
        let mut stmt = conn.prepare(
            "SELECT ps.created_at, ps.duration_minutes,
                    COALESCE(i.name, ''),
                    COALESCE(l.title, 'Song: ' || s.title, ''),
                    COALESCE(ps.feedback, '')
             FROM practice_sessions ps
             LEFT JOIN lessons l ON l.id = ps.lesson_id
             LEFT JOIN instruments i ON i.id = l.instrument_id
             LEFT JOIN songs s ON s.id = ps.song_id
             WHERE ps.user_id = ?1
             ORDER BY ps.created_at DESC, ps.id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], |row| {
            Ok(PracticeSessionSummary {
                date: row.get(0)?,
                duration: row.get(1)?,
                instrument: row.get(2)?,
                focus: row.get(3)?,
                notes: row.get(4)?,
            })
        })?;
        Ok(Some(rows.collect::<Result<_, _>>()?))
    }

    pub(crate) async fn instrument_count(&self) -> StoreResult<i64> {
        let conn = self.db.lock().await;
        Ok(conn.query_row("SELECT COUNT(*) FROM instruments", [], |row| row.get(0))?)
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn exists(conn: &Connection, table: &str, id: i64) -> rusqlite::Result<bool> {
    // `table` is always a literal from this module
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", table),
        params![id],
        |row| row.get(0),
    )
}

fn load_user(conn: &Connection, id: i64) -> StoreResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, name, email, skill_level, created_at, updated_at FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    skill_level: row.get(3)?,
                    instruments: Vec::new(),
                    created_at: row.get(4)?,
                    updated_at: row.get(5)?,
                })
            },
        )
        .optional()?;

    let Some(mut user) = user else {
        return Ok(None);
    };
    let mut stmt = conn.prepare(
        "SELECT i.name FROM user_instruments ui
         JOIN instruments i ON i.id = ui.instrument_id
         WHERE ui.user_id = ?1 ORDER BY i.id",
    )?;
    let names = stmt.query_map(params![id], |row| row.get(0))?;
    user.instruments = names.collect::<Result<_, _>>()?;
    Ok(Some(user))
}

fn song_from_row(row: &Row<'_>) -> rusqlite::Result<Song> {
    Ok(Song {
        id: row.get(0)?,
        title: row.get(1)?,
        artist: row.get(2)?,
        genre: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Salted SHA-256 as `salt$hex`.
fn hash_password(password: &str) -> String {
    let salt = uuid::Uuid::new_v4().simple().to_string();
    format!("{}${}", salt, digest(&salt, password))
}

#[cfg(test)]
fn password_matches(stored: &str, password: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, hash)) => digest(salt, password) == hash,
        None => false,
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}
