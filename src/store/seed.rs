// Demo catalogue
//
// Two users, three instruments, two lessons, two songs and a practice
// session each. Skipped when any instrument already exists.

use super::models::{NewInstrument, NewLesson, NewPracticeSession, NewSong, NewUser};
use super::{Store, StoreResult};

/// Insert the demo data. Returns `false` if the database was already seeded.
pub async fn seed_demo_data(store: &Store) -> StoreResult<bool> {
    if store.instrument_count().await? > 0 {
        tracing::info!("Database already has instruments, skipping seed");
        return Ok(false);
    }

    let instrument = |name: &str, kind: &str| NewInstrument {
        name: name.to_string(),
        kind: Some(kind.to_string()),
    };
    let piano = store.create_instrument(instrument("Piano", "Keyboard")).await?;
    let guitar = store.create_instrument(instrument("Guitar", "String")).await?;
    let drums = store.create_instrument(instrument("Drums", "Percussion")).await?;

    let alice = store
        .create_user(NewUser {
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "password123".to_string(),
            skill_level: Some("Beginner".to_string()),
            instrument_ids: vec![piano.id, guitar.id],
        })
        .await?;
    let bob = store
        .create_user(NewUser {
            name: "Bob".to_string(),
            email: "bob@example.com".to_string(),
            password: "password456".to_string(),
            skill_level: Some("Intermediate".to_string()),
            instrument_ids: vec![guitar.id, drums.id],
        })
        .await?;

    let scales = store
        .create_lesson(NewLesson {
            title: "Basic Piano Scales".to_string(),
            lesson_type: Some("Theory".to_string()),
            instrument_id: Some(piano.id),
            difficulty: Some("Beginner".to_string()),
            content: Some("Learn C major scales".to_string()),
        })
        .await?;
    store
        .create_lesson(NewLesson {
            title: "Guitar Chords 101".to_string(),
            lesson_type: Some("Practice".to_string()),
            instrument_id: Some(guitar.id),
            difficulty: Some("Beginner".to_string()),
            content: Some("Learn major and minor chords".to_string()),
        })
        .await?;

    store
        .create_song(NewSong {
            title: "Imagine".to_string(),
            artist: Some("John Lennon".to_string()),
            genre: Some("Pop".to_string()),
        })
        .await?;
    let wonderwall = store
        .create_song(NewSong {
            title: "Wonderwall".to_string(),
            artist: Some("Oasis".to_string()),
            genre: Some("Rock".to_string()),
        })
        .await?;

    store
        .create_practice_session(
            alice.id,
            NewPracticeSession {
                lesson_id: Some(scales.id),
                song_id: None,
                duration_minutes: 30,
                feedback: Some("Good progress!".to_string()),
            },
        )
        .await?;
    store
        .create_practice_session(
            bob.id,
            NewPracticeSession {
                lesson_id: None,
                song_id: Some(wonderwall.id),
                duration_minutes: 45,
                feedback: Some("Needs improvement on chords".to_string()),
            },
        )
        .await?;

    tracing::info!("Database seeding complete");
    Ok(true)
}
