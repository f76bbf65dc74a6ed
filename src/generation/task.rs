// Generation tasks and their typed requests
//
// Each HTTP body is validated into exactly one `GenerationRequest` variant
// before it reaches the prompt builder or the orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::lenient;

/// The nine generation tasks the studio supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTask {
    SongArrangement,
    ChordProgression,
    BackingTrack,
    RhythmPattern,
    Melody,
    ImprovTips,
    Lyrics,
    PracticeAdvice,
    Lesson,
}

impl GenerationTask {
    pub const ALL: [GenerationTask; 9] = [
        Self::SongArrangement,
        Self::ChordProgression,
        Self::BackingTrack,
        Self::RhythmPattern,
        Self::Melody,
        Self::ImprovTips,
        Self::Lyrics,
        Self::PracticeAdvice,
        Self::Lesson,
    ];

    /// Human-readable label used in logs and error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::SongArrangement => "song arrangement",
            Self::ChordProgression => "chord progression",
            Self::BackingTrack => "backing track",
            Self::RhythmPattern => "rhythm pattern",
            Self::Melody => "melody",
            Self::ImprovTips => "improv tips",
            Self::Lyrics => "lyrics",
            Self::PracticeAdvice => "practice advice",
            Self::Lesson => "lesson",
        }
    }
}

impl fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Instrument a song arrangement is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instrument {
    #[default]
    Guitar,
    Bass,
    Ukulele,
    Piano,
}

impl Instrument {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Guitar => "Guitar",
            Self::Bass => "Bass",
            Self::Ukulele => "Ukulele",
            Self::Piano => "Piano",
        }
    }

    /// Standard tuning, low string first.
    pub fn standard_tuning(&self) -> &'static str {
        match self {
            Self::Guitar => "E A D G B E",
            Self::Bass => "E A D G",
            Self::Ukulele => "G C E A",
            Self::Piano => "N/A",
        }
    }

    /// Number of strings a chord diagram needs (0 for keyboards).
    pub fn string_count(&self) -> usize {
        match self {
            Self::Guitar => 6,
            Self::Bass => 4,
            Self::Ukulele => 4,
            Self::Piano => 0,
        }
    }
}

/// Options shared by the song arrangement and chord progression tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct SongQuery {
    pub song_query: String,
    pub simplify: bool,
    pub help_practice: bool,
    pub show_substitutions: bool,
    pub instrument: Instrument,
}

impl SongQuery {
    pub fn new(song_query: impl Into<String>) -> Self {
        Self {
            song_query: song_query.into(),
            simplify: true,
            help_practice: true,
            show_substitutions: true,
            instrument: Instrument::Guitar,
        }
    }

    pub fn with_simplify(mut self, simplify: bool) -> Self {
        self.simplify = simplify;
        self
    }

    pub fn with_help_practice(mut self, help_practice: bool) -> Self {
        self.help_practice = help_practice;
        self
    }

    pub fn with_substitutions(mut self, show_substitutions: bool) -> Self {
        self.show_substitutions = show_substitutions;
        self
    }

    pub fn with_instrument(mut self, instrument: Instrument) -> Self {
        self.instrument = instrument;
        self
    }
}

/// One logged practice session, as fed into the practice-advice prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSessionSummary {
    #[serde(default)]
    pub date: String,
    /// Minutes practised. Fractional or quoted values are rounded.
    #[serde(default, deserialize_with = "lenient::uint")]
    pub duration: u32,
    #[serde(default)]
    pub instrument: String,
    #[serde(default)]
    pub focus: String,
    #[serde(default)]
    pub notes: String,
}

/// A validated request for exactly one generation task.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    SongArrangement(SongQuery),
    ChordProgression(SongQuery),
    BackingTrack {
        prompt: String,
    },
    RhythmPattern {
        time_signature: String,
        level: String,
    },
    Melody {
        key: String,
        style: String,
    },
    ImprovTips {
        query: String,
    },
    Lyrics {
        topic: String,
        genre: String,
        mood: String,
    },
    PracticeAdvice {
        sessions: Vec<PracticeSessionSummary>,
    },
    Lesson {
        skill_level: String,
        instrument: String,
        focus: String,
    },
}

impl GenerationRequest {
    pub fn task(&self) -> GenerationTask {
        match self {
            Self::SongArrangement(_) => GenerationTask::SongArrangement,
            Self::ChordProgression(_) => GenerationTask::ChordProgression,
            Self::BackingTrack { .. } => GenerationTask::BackingTrack,
            Self::RhythmPattern { .. } => GenerationTask::RhythmPattern,
            Self::Melody { .. } => GenerationTask::Melody,
            Self::ImprovTips { .. } => GenerationTask::ImprovTips,
            Self::Lyrics { .. } => GenerationTask::Lyrics,
            Self::PracticeAdvice { .. } => GenerationTask::PracticeAdvice,
            Self::Lesson { .. } => GenerationTask::Lesson,
        }
    }

    /// Short description of the request for log lines.
    pub fn subject(&self) -> String {
        match self {
            Self::SongArrangement(q) | Self::ChordProgression(q) => q.song_query.clone(),
            Self::BackingTrack { prompt } => prompt.clone(),
            Self::RhythmPattern {
                time_signature,
                level,
            } => format!("{} / {}", time_signature, level),
            Self::Melody { key, style } => format!("{} / {}", key, style),
            Self::ImprovTips { query } => query.clone(),
            Self::Lyrics { topic, .. } => topic.clone(),
            Self::PracticeAdvice { sessions } => format!("{} session(s)", sessions.len()),
            Self::Lesson {
                skill_level, focus, ..
            } => format!("{} / {}", skill_level, focus),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_duration_accepts_fractional_and_quoted_minutes() {
        let session: PracticeSessionSummary =
            serde_json::from_str(r#"{"date": "2024-03-01", "duration": 22.5}"#).unwrap();
        assert_eq!(session.duration, 23);

        let session: PracticeSessionSummary =
            serde_json::from_str(r#"{"duration": "45"}"#).unwrap();
        assert_eq!(session.duration, 45);

        let session: PracticeSessionSummary = serde_json::from_str("{}").unwrap();
        assert_eq!(session.duration, 0);

        assert!(serde_json::from_str::<PracticeSessionSummary>(r#"{"duration": -5}"#).is_err());
    }

    #[test]
    fn test_request_maps_to_task() {
        let req = GenerationRequest::ChordProgression(SongQuery::new("Imagine"));
        assert_eq!(req.task(), GenerationTask::ChordProgression);

        let req = GenerationRequest::Lyrics {
            topic: "rain".to_string(),
            genre: "folk".to_string(),
            mood: "wistful".to_string(),
        };
        assert_eq!(req.task(), GenerationTask::Lyrics);
    }

    #[test]
    fn test_song_query_defaults_match_api_defaults() {
        let q = SongQuery::new("Let It Be");
        assert!(q.simplify);
        assert!(q.help_practice);
        assert!(q.show_substitutions);
        assert_eq!(q.instrument, Instrument::Guitar);
    }

    #[test]
    fn test_instrument_deserializes_lowercase() {
        let i: Instrument = serde_json::from_str("\"ukulele\"").unwrap();
        assert_eq!(i, Instrument::Ukulele);
        assert_eq!(i.standard_tuning(), "G C E A");
    }

    #[test]
    fn test_task_labels_are_unique() {
        let mut labels: Vec<_> = GenerationTask::ALL.iter().map(|t| t.label()).collect();
        labels.sort();
        labels.dedup();
        assert_eq!(labels.len(), GenerationTask::ALL.len());
    }
}
