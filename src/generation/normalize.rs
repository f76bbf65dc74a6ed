// Result normalization
//
// Providers disagree on field names ("tips" vs "practiceTips", "title" vs
// "songTitle") and on whether empty collections are omitted. The table below
// maps every accepted provider spelling onto the canonical field and declares
// which fields are required. Normalization never invents musical content:
// missing required fields fail the attempt, missing optional fields get the
// empty value for their kind.

use serde_json::{Map, Value};

use super::task::GenerationTask;
use super::types::CanonicalResult;
use crate::errors::ValidationError;

/// JSON kind of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Array,
    Object,
}

impl FieldKind {
    /// Type-appropriate empty value, never `null`.
    pub fn empty(&self) -> Value {
        match self {
            Self::Text => Value::String(String::new()),
            Self::Number => Value::from(0),
            Self::Array => Value::Array(Vec::new()),
            Self::Object => Value::Object(Map::new()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Provider spellings accepted when `name` itself is absent, in priority order.
    pub aliases: &'static [&'static str],
}

const fn req(name: &'static str, kind: FieldKind, aliases: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
        aliases,
    }
}

const fn opt(name: &'static str, kind: FieldKind, aliases: &'static [&'static str]) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
        aliases,
    }
}

use FieldKind::{Array, Number, Object, Text};

const SONG_ARRANGEMENT: &[FieldSpec] = &[
    req("songTitle", Text, &["title", "song_title", "song"]),
    req("artist", Text, &["artistName"]),
    req("key", Text, &["songKey"]),
    req("instrument", Text, &[]),
    req("tuning", Text, &[]),
    req("progressionSummary", Array, &["chordSummary", "progression_summary"]),
    req("tablature", Array, &["tabs", "tab"]),
    req("chordDiagrams", Array, &["diagrams", "chord_diagrams"]),
    opt("capoFret", Number, &["capo"]),
    opt("progression", Array, &["chords"]),
    opt("substitutions", Array, &["chordSubstitutions"]),
    opt("practiceTips", Array, &["tips", "practice_tips"]),
];

const CHORD_PROGRESSION: &[FieldSpec] = &[
    req("songTitle", Text, &["title", "song_title", "song"]),
    req("artist", Text, &["artistName"]),
    req("key", Text, &["songKey"]),
    req("progression", Array, &["chords"]),
    opt("substitutions", Array, &["chordSubstitutions"]),
    opt("practiceTips", Array, &["tips", "practice_tips"]),
];

const BACKING_TRACK: &[FieldSpec] = &[
    req("title", Text, &["name"]),
    req("style", Text, &["genre"]),
    req("bpm", Number, &["tempo"]),
    req("key", Text, &[]),
    req("tracks", Array, &["instruments", "parts"]),
    opt("youtubeQueries", Array, &["youtube_queries", "searchQueries"]),
    opt("description", Text, &["notes"]),
];

const RHYTHM_PATTERN: &[FieldSpec] = &[
    req("pattern", Text, &["rhythm", "strummingPattern"]),
    opt("description", Text, &["explanation"]),
    opt("difficulty", Text, &["level"]),
];

const MELODY: &[FieldSpec] = &[
    req("melody", Text, &["notes"]),
    opt("description", Text, &["explanation"]),
    opt("style", Text, &["genre"]),
];

const IMPROV_TIPS: &[FieldSpec] = &[
    req("response", Text, &["tips", "advice"]),
    opt("scales", Array, &[]),
    opt("targetNotes", Array, &["target_notes"]),
    opt("techniques", Array, &[]),
];

const LYRICS: &[FieldSpec] = &[
    req("lyrics", Text, &["song", "text"]),
    opt("title", Text, &[]),
    opt("structure", Text, &["form"]),
];

const PRACTICE_ADVICE: &[FieldSpec] = &[
    req("advice", Text, &["insight", "summary"]),
    opt("insights", Array, &["observations"]),
    opt("nextGoals", Array, &["goals", "next_goals"]),
];

const LESSON: &[FieldSpec] = &[
    req("title", Text, &["lessonTitle"]),
    req("lesson", Text, &["content", "body"]),
    req("duration", Text, &["length", "durationMinutes"]),
    req("goals", Array, &["objectives"]),
    opt("exercises", Array, &["drills"]),
    opt("skillLevel", Text, &["skill_level", "level"]),
    opt("instrument", Text, &[]),
];

/// Field table for a task.
pub fn schema_for(task: GenerationTask) -> &'static [FieldSpec] {
    match task {
        GenerationTask::SongArrangement => SONG_ARRANGEMENT,
        GenerationTask::ChordProgression => CHORD_PROGRESSION,
        GenerationTask::BackingTrack => BACKING_TRACK,
        GenerationTask::RhythmPattern => RHYTHM_PATTERN,
        GenerationTask::Melody => MELODY,
        GenerationTask::ImprovTips => IMPROV_TIPS,
        GenerationTask::Lyrics => LYRICS,
        GenerationTask::PracticeAdvice => PRACTICE_ADVICE,
        GenerationTask::Lesson => LESSON,
    }
}

/// Names of the required fields for a task.
pub fn required_fields(task: GenerationTask) -> Vec<&'static str> {
    schema_for(task)
        .iter()
        .filter(|f| f.required)
        .map(|f| f.name)
        .collect()
}

/// Map a provider object onto the canonical field set for `task`.
///
/// Unknown keys are dropped. Every missing required field is reported in one
/// `MissingFields` error.
pub fn normalize_fields(
    task: GenerationTask,
    mut raw: Map<String, Value>,
) -> Result<Map<String, Value>, ValidationError> {
    let mut out = Map::new();
    let mut missing = Vec::new();

    for spec in schema_for(task) {
        let found = std::iter::once(spec.name)
            .chain(spec.aliases.iter().copied())
            .find_map(|key| raw.remove(key).filter(|v| !v.is_null()));

        match found.and_then(|v| coerce(spec.kind, v)) {
            Some(value) => {
                out.insert(spec.name.to_string(), value);
            }
            None if spec.required => missing.push(spec.name.to_string()),
            None => {
                out.insert(spec.name.to_string(), spec.kind.empty());
            }
        }
    }

    if !missing.is_empty() {
        return Err(ValidationError::MissingFields {
            task,
            fields: missing,
        });
    }
    Ok(out)
}

/// Normalize and type-check a provider object in one step.
pub fn normalize(
    task: GenerationTask,
    raw: Map<String, Value>,
) -> Result<CanonicalResult, ValidationError> {
    let fields = normalize_fields(task, raw)?;
    CanonicalResult::from_normalized(task, Value::Object(fields))
}

/// Coerce a provider value to `kind`; `None` means it cannot stand in for the field.
fn coerce(kind: FieldKind, value: Value) -> Option<Value> {
    match (kind, value) {
        (Text, Value::String(s)) => Some(Value::String(s)),
        (Text, Value::Number(n)) => Some(Value::String(n.to_string())),
        (Text, Value::Array(items)) => {
            let lines: Option<Vec<String>> = items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            lines.map(|l| Value::String(l.join("\n")))
        }
        (Number, Value::Number(n)) => Some(Value::Number(n)),
        (Number, Value::String(s)) => {
            let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u64>().ok().map(Value::from)
        }
        (Array, Value::Array(items)) => Some(Value::Array(items)),
        (Object, Value::Object(map)) => Some(Value::Object(map)),
        _ => None,
    }
}
