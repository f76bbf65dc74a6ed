// Canonical result types
//
// These are the shapes returned to clients regardless of which provider
// produced them. Field names serialize in camelCase to match the front-end.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::task::GenerationTask;
use crate::errors::ValidationError;

/// Lenient number parsing for values models often quote ("4" instead of 4).
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn uint<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(d)?;
        match as_f64(&value) {
            Some(n) if n >= 0.0 && n <= u32::MAX as f64 => Ok(n.round() as u32),
            _ => Err(serde::de::Error::custom(format!(
                "expected a non-negative number, got {}",
                value
            ))),
        }
    }

    pub fn float<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(d)?;
        as_f64(&value).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a number, got {}", value))
        })
    }

    pub fn opt_float<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        let value = Value::deserialize(d)?;
        if value.is_null() {
            return Ok(None);
        }
        as_f64(&value).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a number, got {}", value))
        })
    }
}

fn default_duration() -> u32 {
    4
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub chord: String,
    #[serde(default = "default_duration", deserialize_with = "lenient::uint")]
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    #[serde(alias = "original")]
    pub original_chord: String,
    #[serde(alias = "substitute")]
    pub substituted_chord: String,
    #[serde(default)]
    pub theory: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabLine {
    #[serde(alias = "text", alias = "line")]
    pub lyrics: String,
    /// True for a chord-name line that sits above a lyric line.
    #[serde(default)]
    pub is_chord_line: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabSection {
    #[serde(alias = "name")]
    pub section: String,
    #[serde(default)]
    pub lines: Vec<TabLine>,
}

/// Fret position of one string in a chord diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fret {
    Muted,
    /// 0 is an open string.
    At(u16),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFret {
    Number(i64),
    Text(String),
}

impl TryFrom<RawFret> for Fret {
    type Error = String;

    fn try_from(raw: RawFret) -> Result<Self, Self::Error> {
        match raw {
            RawFret::Number(-1) => Ok(Fret::Muted),
            RawFret::Number(n) => u16::try_from(n)
                .map(Fret::At)
                .map_err(|_| format!("fret {} out of range", n)),
            RawFret::Text(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("x") {
                    return Ok(Fret::Muted);
                }
                s.parse::<i64>()
                    .map_err(|_| format!("invalid fret marker {:?}", s))
                    .and_then(|n| Fret::try_from(RawFret::Number(n)))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Fret {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = RawFret::deserialize(d)?;
        Fret::try_from(raw).map_err(serde::de::Error::custom)
    }
}

impl Serialize for Fret {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Fret::Muted => s.serialize_str("X"),
            Fret::At(n) => s.serialize_u16(*n),
        }
    }
}

/// Fretting finger, 1 (index) to 4 (pinky); 0 means no finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Finger(u8);

impl Finger {
    pub fn number(&self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Finger {
    type Error = String;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        if (0..=4).contains(&n) {
            Ok(Finger(n as u8))
        } else {
            Err(format!("finger {} out of range 0-4", n))
        }
    }
}

impl From<Finger> for u8 {
    fn from(f: Finger) -> u8 {
        f.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordDiagram {
    #[serde(alias = "name")]
    pub chord: String,
    pub frets: Vec<Fret>,
    #[serde(default)]
    pub fingers: Vec<Option<Finger>>,
    #[serde(default, deserialize_with = "lenient::uint")]
    pub capo_fret: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongArrangement {
    pub song_title: String,
    pub artist: String,
    pub key: String,
    pub instrument: String,
    pub tuning: String,
    #[serde(deserialize_with = "lenient::uint")]
    pub capo_fret: u32,
    pub progression_summary: Vec<String>,
    pub progression: Vec<Chord>,
    pub tablature: Vec<TabSection>,
    pub chord_diagrams: Vec<ChordDiagram>,
    pub substitutions: Vec<Substitution>,
    pub practice_tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordProgression {
    pub song_title: String,
    pub artist: String,
    pub key: String,
    pub progression: Vec<Chord>,
    pub substitutions: Vec<Substitution>,
    pub practice_tips: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackingStep {
    #[serde(deserialize_with = "lenient::float")]
    pub beat: f64,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient::opt_float",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackingTrackPart {
    pub instrument: String,
    #[serde(default)]
    pub steps: Vec<BackingStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackingTrack {
    pub title: String,
    pub style: String,
    #[serde(deserialize_with = "lenient::uint")]
    pub bpm: u32,
    pub key: String,
    pub tracks: Vec<BackingTrackPart>,
    pub youtube_queries: Vec<String>,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RhythmPattern {
    pub pattern: String,
    pub description: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Melody {
    pub melody: String,
    pub description: String,
    pub style: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovTips {
    pub response: String,
    pub scales: Vec<String>,
    pub target_notes: Vec<String>,
    pub techniques: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lyrics {
    pub lyrics: String,
    pub title: String,
    pub structure: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeAdvice {
    pub advice: String,
    pub insights: Vec<String>,
    pub next_goals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonExercise {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::uint")]
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub title: String,
    pub lesson: String,
    pub duration: String,
    pub goals: Vec<String>,
    pub exercises: Vec<LessonExercise>,
    pub skill_level: String,
    pub instrument: String,
}

/// A validated, task-specific result. Serializes as the bare inner object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CanonicalResult {
    SongArrangement(SongArrangement),
    ChordProgression(ChordProgression),
    BackingTrack(BackingTrack),
    RhythmPattern(RhythmPattern),
    Melody(Melody),
    ImprovTips(ImprovTips),
    Lyrics(Lyrics),
    PracticeAdvice(PracticeAdvice),
    Lesson(Lesson),
}

impl CanonicalResult {
    /// Deserialize a normalized object into the typed result for `task`.
    pub fn from_normalized(task: GenerationTask, value: Value) -> Result<Self, ValidationError> {
        fn parse<T: serde::de::DeserializeOwned>(
            task: GenerationTask,
            value: Value,
        ) -> Result<T, ValidationError> {
            serde_json::from_value(value).map_err(|e| ValidationError::InvalidShape {
                task,
                reason: e.to_string(),
            })
        }

        Ok(match task {
            GenerationTask::SongArrangement => Self::SongArrangement(parse(task, value)?),
            GenerationTask::ChordProgression => Self::ChordProgression(parse(task, value)?),
            GenerationTask::BackingTrack => Self::BackingTrack(parse(task, value)?),
            GenerationTask::RhythmPattern => Self::RhythmPattern(parse(task, value)?),
            GenerationTask::Melody => Self::Melody(parse(task, value)?),
            GenerationTask::ImprovTips => Self::ImprovTips(parse(task, value)?),
            GenerationTask::Lyrics => Self::Lyrics(parse(task, value)?),
            GenerationTask::PracticeAdvice => Self::PracticeAdvice(parse(task, value)?),
            GenerationTask::Lesson => Self::Lesson(parse(task, value)?),
        })
    }

    pub fn task(&self) -> GenerationTask {
        match self {
            Self::SongArrangement(_) => GenerationTask::SongArrangement,
            Self::ChordProgression(_) => GenerationTask::ChordProgression,
            Self::BackingTrack(_) => GenerationTask::BackingTrack,
            Self::RhythmPattern(_) => GenerationTask::RhythmPattern,
            Self::Melody(_) => GenerationTask::Melody,
            Self::ImprovTips(_) => GenerationTask::ImprovTips,
            Self::Lyrics(_) => GenerationTask::Lyrics,
            Self::PracticeAdvice(_) => GenerationTask::PracticeAdvice,
            Self::Lesson(_) => GenerationTask::Lesson,
        }
    }
}
