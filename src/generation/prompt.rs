// Prompt construction for every generation task
//
// The schema skeleton embedded in each prompt is the only contract the model
// sees, so it must list every canonical field the normalizer expects.
// Rendering is pure: the same request always yields byte-identical text.

use super::task::{GenerationRequest, PracticeSessionSummary, SongQuery};

/// Final line of every prompt.
pub const JSON_ONLY_INSTRUCTION: &str =
    "Return ONLY the JSON object. No explanations, no markdown, no code fences.";

const SONG_ARRANGEMENT_SCHEMA: &str = r#"{
  "songTitle": "Exact song title",
  "artist": "Artist name",
  "key": "e.g. G Major or E Minor",
  "instrument": "Guitar",
  "tuning": "E A D G B E",
  "capoFret": 0,
  "progressionSummary": ["G", "D", "Em", "C"],
  "progression": [
    {"chord": "G", "duration": 4},
    {"chord": "D", "duration": 4}
  ],
  "tablature": [
    {
      "section": "Verse 1",
      "lines": [
        {"lyrics": "G              D", "isChordLine": true},
        {"lyrics": "First line of the lyric", "isChordLine": false}
      ]
    }
  ],
  "chordDiagrams": [
    {"chord": "G", "frets": [3, 2, 0, 0, 0, 3], "fingers": [2, 1, 0, 0, 0, 3], "capoFret": 0},
    {"chord": "D", "frets": ["X", "X", 0, 2, 3, 2], "fingers": [0, 0, 0, 1, 3, 2], "capoFret": 0}
  ],
  "substitutions": [
    {"originalChord": "G", "substitutedChord": "Gmaj7", "theory": "Softens the tonic"}
  ],
  "practiceTips": ["Practice the G to D change slowly with a metronome"]
}"#;

const CHORD_PROGRESSION_SCHEMA: &str = r#"{
  "songTitle": "Exact song title",
  "artist": "Artist name",
  "key": "e.g. C Major or A Minor",
  "progression": [
    {"chord": "C", "duration": 4},
    {"chord": "G", "duration": 4},
    {"chord": "Am", "duration": 4},
    {"chord": "F", "duration": 4}
  ],
  "substitutions": [
    {"originalChord": "C", "substitutedChord": "Cmaj7", "theory": "Adds a more sophisticated, jazzy sound"}
  ],
  "practiceTips": [
    "Practice slowly with a metronome",
    "Focus on smooth chord transitions"
  ]
}"#;

const BACKING_TRACK_SCHEMA: &str = r#"{
  "title": "Track title",
  "style": "e.g. Slow Blues Shuffle",
  "bpm": 90,
  "key": "A",
  "tracks": [
    {"instrument": "drums", "steps": [{"beat": 1, "notes": ["kick", "hihat"]}, {"beat": 2, "notes": ["snare", "hihat"]}]},
    {"instrument": "bass", "steps": [{"beat": 1, "notes": ["A2"], "duration": 1}]},
    {"instrument": "keys", "steps": [{"beat": 1, "notes": ["A3", "C#4", "E4"], "duration": 4}]}
  ],
  "youtubeQueries": ["slow blues backing track in A"],
  "description": "One or two sentences describing the groove"
}"#;

const RHYTHM_PATTERN_SCHEMA: &str = r#"{
  "pattern": "D-DU-UDU",
  "description": "How to count and play the pattern",
  "difficulty": "beginner"
}"#;

const MELODY_SCHEMA: &str = r#"{
  "melody": "C4 E4 G4 C5 | B4 G4 E4 C4",
  "description": "What makes the phrase work",
  "style": "pop"
}"#;

const IMPROV_TIPS_SCHEMA: &str = r#"{
  "response": "Concise, practical improvisation advice",
  "scales": ["A minor pentatonic"],
  "targetNotes": ["C# over the A7 chord"],
  "techniques": ["call and response", "bends into chord tones"]
}"#;

const LYRICS_SCHEMA: &str = r#"{
  "title": "Song title",
  "structure": "Verse - Chorus - Verse - Chorus - Bridge - Chorus",
  "lyrics": "[Verse 1]\nFirst line\nSecond line\n\n[Chorus]\n..."
}"#;

const PRACTICE_ADVICE_SCHEMA: &str = r#"{
  "advice": "A short paragraph of coaching based on the sessions",
  "insights": ["Observation drawn from the practice history"],
  "nextGoals": ["Concrete goal for the next week"]
}"#;

const LESSON_SCHEMA: &str = r#"{
  "title": "Lesson title",
  "skillLevel": "beginner",
  "instrument": "guitar",
  "duration": "30 minutes",
  "goals": ["What the student can do after the lesson"],
  "lesson": "The lesson text, step by step",
  "exercises": [
    {"name": "Exercise name", "description": "How to practise it", "minutes": 10}
  ]
}"#;

/// Render the prompt for a request.
pub fn build(request: &GenerationRequest) -> String {
    match request {
        GenerationRequest::SongArrangement(query) => song_arrangement(query),
        GenerationRequest::ChordProgression(query) => chord_progression(query),
        GenerationRequest::BackingTrack { prompt } => backing_track(prompt),
        GenerationRequest::RhythmPattern {
            time_signature,
            level,
        } => rhythm_pattern(time_signature, level),
        GenerationRequest::Melody { key, style } => melody(key, style),
        GenerationRequest::ImprovTips { query } => improv_tips(query),
        GenerationRequest::Lyrics { topic, genre, mood } => lyrics(topic, genre, mood),
        GenerationRequest::PracticeAdvice { sessions } => practice_advice(sessions),
        GenerationRequest::Lesson {
            skill_level,
            instrument,
            focus,
        } => lesson(skill_level, instrument, focus),
    }
}

fn render(role: &str, task: &str, schema: &str, rules: &[String]) -> String {
    let mut prompt = String::new();
    prompt.push_str(role);
    prompt.push_str("\n\n");
    prompt.push_str(task);
    prompt.push_str("\n\nRespond with JSON matching this exact structure:\n\n");
    prompt.push_str(schema);
    prompt.push_str("\n\nRULES:\n");
    for rule in rules {
        prompt.push_str("- ");
        prompt.push_str(rule);
        prompt.push('\n');
    }
    prompt.push('\n');
    prompt.push_str(JSON_ONLY_INSTRUCTION);
    prompt
}

fn song_rules(query: &SongQuery) -> Vec<String> {
    let mut rules = vec![
        "Use standard chord notation".to_string(),
        "Keep durations realistic (2, 4, or 8 beats)".to_string(),
    ];
    rules.push(if query.simplify {
        "Use only basic open chords (C, G, D, Am, Em, etc.), no barre chords".to_string()
    } else {
        "Include richer voicings and extensions when appropriate".to_string()
    });
    if !query.show_substitutions {
        rules.push("Return an empty substitutions array".to_string());
    }
    if !query.help_practice {
        rules.push("Return an empty practiceTips array".to_string());
    }
    rules.push(
        "Provide accurate information based on real musical analysis; do not invent a progression"
            .to_string(),
    );
    rules
}

fn song_arrangement(query: &SongQuery) -> String {
    let instrument = query.instrument;
    let mut rules = song_rules(query);
    rules.push(format!(
        "Write the arrangement for {} in {} tuning unless the recording uses another tuning",
        instrument.name(),
        instrument.standard_tuning()
    ));
    if instrument.string_count() > 0 {
        rules.push(format!(
            "Every chord diagram lists exactly {} frets, low string first; use \"X\" for a muted string and 0 for an open string",
            instrument.string_count()
        ));
        rules.push(
            "fingers uses 1-4 for index to pinky and 0 for an open or unplayed string".to_string(),
        );
    } else {
        rules.push("Return an empty chordDiagrams array for keyboard instruments".to_string());
    }
    rules.push(
        "In tablature, put chord names on their own line with isChordLine true, directly above the lyric line they belong to"
            .to_string(),
    );

    render(
        "You are a world-class music theory teacher and professional session musician.",
        &format!(
            "Create a complete playable arrangement of the song \"{}\" for {}.",
            query.song_query,
            instrument.name()
        ),
        SONG_ARRANGEMENT_SCHEMA,
        &rules,
    )
}

fn chord_progression(query: &SongQuery) -> String {
    render(
        "You are a world-class music theory teacher and professional guitarist.",
        &format!(
            "Analyze the song \"{}\" and describe its chord progression for {}.",
            query.song_query,
            query.instrument.name()
        ),
        CHORD_PROGRESSION_SCHEMA,
        &song_rules(query),
    )
}

fn backing_track(prompt: &str) -> String {
    render(
        "You are a session band leader who writes backing track charts.",
        &format!("Arrange a backing track for this request: \"{}\".", prompt),
        BACKING_TRACK_SCHEMA,
        &[
            "Include at least drums and bass; add keys or guitar when the style calls for it"
                .to_string(),
            "Beats are 1-based within a bar; notes use scientific pitch (A2, C#4) or drum voices"
                .to_string(),
            "bpm is an integer".to_string(),
        ],
    )
}

fn rhythm_pattern(time_signature: &str, level: &str) -> String {
    render(
        "You are a rhythm guitar coach.",
        &format!(
            "Create one strumming or rhythm pattern in {} time for a {} player.",
            time_signature, level
        ),
        RHYTHM_PATTERN_SCHEMA,
        &[
            "Use D for down, U for up, - for a rest or ghost strum, x for a muted hit".to_string(),
            format!("The pattern must fill exactly one bar of {}", time_signature),
            format!("Set difficulty to \"{}\"", level),
        ],
    )
}

fn melody(key: &str, style: &str) -> String {
    render(
        "You are a melodic composer and songwriting teacher.",
        &format!("Write a short, singable melody in {} in a {} style.", key, style),
        MELODY_SCHEMA,
        &[
            "Write notes in scientific pitch notation separated by spaces".to_string(),
            "Separate bars with |".to_string(),
            "Keep it between 2 and 8 bars".to_string(),
        ],
    )
}

fn improv_tips(query: &str) -> String {
    render(
        "You are an experienced improvising musician and teacher.",
        &format!("Answer this improvisation question: \"{}\".", query),
        IMPROV_TIPS_SCHEMA,
        &[
            "Keep the response practical and under 150 words".to_string(),
            "List scales and target notes that fit the harmony in the question".to_string(),
        ],
    )
}

fn lyrics(topic: &str, genre: &str, mood: &str) -> String {
    render(
        "You are a professional songwriter.",
        &format!(
            "Write original song lyrics about \"{}\" in the {} genre with a {} mood.",
            topic, genre, mood
        ),
        LYRICS_SCHEMA,
        &[
            "Label sections in square brackets, e.g. [Verse 1], [Chorus]".to_string(),
            "Lyrics must be original; do not quote existing songs".to_string(),
            "Use \\n for line breaks inside the lyrics string".to_string(),
        ],
    )
}

fn practice_advice(sessions: &[PracticeSessionSummary]) -> String {
    let history = if sessions.is_empty() {
        "No sessions have been logged yet.".to_string()
    } else {
        sessions
            .iter()
            .map(|s| {
                format!(
                    "- {}: {} min of {} focusing on {}. Notes: {}",
                    if s.date.is_empty() { "undated" } else { &s.date },
                    s.duration,
                    if s.instrument.is_empty() { "practice" } else { &s.instrument },
                    if s.focus.is_empty() { "general skills" } else { &s.focus },
                    if s.notes.is_empty() { "none" } else { &s.notes },
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };
    let total: u64 = sessions.iter().map(|s| u64::from(s.duration)).sum();

    render(
        "You are an encouraging but honest music practice coach.",
        &format!(
            "Review this practice history ({} session(s), {} minutes total) and give coaching advice.\n\n{}",
            sessions.len(),
            total,
            history
        ),
        PRACTICE_ADVICE_SCHEMA,
        &[
            "Base every insight on the sessions above".to_string(),
            "Suggest no more than three next goals".to_string(),
        ],
    )
}

fn lesson(skill_level: &str, instrument: &str, focus: &str) -> String {
    render(
        "You are a patient, structured music teacher.",
        &format!(
            "Plan a single {} lesson for a {} student focusing on {}.",
            instrument, skill_level, focus
        ),
        LESSON_SCHEMA,
        &[
            "duration is a human-readable string such as \"30 minutes\"".to_string(),
            "Order exercises from warm-up to application".to_string(),
            format!("Set skillLevel to \"{}\" and instrument to \"{}\"", skill_level, instrument),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::normalize::schema_for;
    use crate::generation::task::{GenerationTask, Instrument};

    fn every_request() -> Vec<GenerationRequest> {
        vec![
            GenerationRequest::SongArrangement(SongQuery::new("Wonderwall")),
            GenerationRequest::ChordProgression(SongQuery::new("Imagine")),
            GenerationRequest::BackingTrack {
                prompt: "slow blues in A".to_string(),
            },
            GenerationRequest::RhythmPattern {
                time_signature: "6/8".to_string(),
                level: "intermediate".to_string(),
            },
            GenerationRequest::Melody {
                key: "D minor".to_string(),
                style: "folk".to_string(),
            },
            GenerationRequest::ImprovTips {
                query: "soloing over ii-V-I".to_string(),
            },
            GenerationRequest::Lyrics {
                topic: "the ocean".to_string(),
                genre: "indie".to_string(),
                mood: "hopeful".to_string(),
            },
            GenerationRequest::PracticeAdvice {
                sessions: vec![PracticeSessionSummary {
                    date: "2024-05-01".to_string(),
                    duration: 30,
                    instrument: "Guitar".to_string(),
                    focus: "barre chords".to_string(),
                    notes: "F still buzzes".to_string(),
                }],
            },
            GenerationRequest::Lesson {
                skill_level: "beginner".to_string(),
                instrument: "piano".to_string(),
                focus: "scales".to_string(),
            },
        ]
    }

    #[test]
    fn test_build_is_deterministic() {
        for request in every_request() {
            assert_eq!(build(&request), build(&request));
        }
    }

    #[test]
    fn test_every_prompt_ends_with_json_only_instruction() {
        for request in every_request() {
            assert!(build(&request).ends_with(JSON_ONLY_INSTRUCTION));
        }
    }

    #[test]
    fn test_schema_skeleton_names_every_canonical_field() {
        for request in every_request() {
            let prompt = build(&request);
            for spec in schema_for(request.task()) {
                assert!(
                    prompt.contains(&format!("\"{}\"", spec.name)),
                    "{} prompt lacks field {}",
                    request.task(),
                    spec.name
                );
            }
        }
    }

    #[test]
    fn test_simplify_switches_chord_instruction() {
        let simple = build(&GenerationRequest::ChordProgression(
            SongQuery::new("Imagine").with_simplify(true),
        ));
        let rich = build(&GenerationRequest::ChordProgression(
            SongQuery::new("Imagine").with_simplify(false),
        ));
        assert!(simple.contains("basic open chords"));
        assert!(!rich.contains("basic open chords"));
        assert!(rich.contains("richer voicings"));
    }

    #[test]
    fn test_substitutions_and_practice_flags() {
        let query = SongQuery::new("Imagine")
            .with_substitutions(false)
            .with_help_practice(false);
        let prompt = build(&GenerationRequest::ChordProgression(query));
        assert!(prompt.contains("Return an empty substitutions array"));
        assert!(prompt.contains("Return an empty practiceTips array"));

        let prompt = build(&GenerationRequest::ChordProgression(SongQuery::new("Imagine")));
        assert!(!prompt.contains("empty substitutions"));
    }

    #[test]
    fn test_query_is_embedded() {
        let prompt = build(&GenerationRequest::SongArrangement(
            SongQuery::new("Hallelujah").with_instrument(Instrument::Ukulele),
        ));
        assert!(prompt.contains("\"Hallelujah\""));
        assert!(prompt.contains("exactly 4 frets"));
        assert!(prompt.contains("G C E A"));
    }

    #[test]
    fn test_piano_arrangement_skips_diagrams() {
        let prompt = build(&GenerationRequest::SongArrangement(
            SongQuery::new("Let It Be").with_instrument(Instrument::Piano),
        ));
        assert!(prompt.contains("empty chordDiagrams array"));
    }

    #[test]
    fn test_practice_history_is_summarised() {
        let prompt = build(&every_request()[7]);
        assert_eq!(every_request()[7].task(), GenerationTask::PracticeAdvice);
        assert!(prompt.contains("1 session(s), 30 minutes total"));
        assert!(prompt.contains("F still buzzes"));

        let empty = build(&GenerationRequest::PracticeAdvice { sessions: vec![] });
        assert!(empty.contains("No sessions have been logged yet."));
    }

    #[test]
    fn test_huge_session_totals_do_not_overflow() {
        let session = PracticeSessionSummary {
            date: "2024-03-01".to_string(),
            duration: 4_000_000_000,
            instrument: "Guitar".to_string(),
            focus: "Endurance".to_string(),
            notes: String::new(),
        };
        let prompt = build(&GenerationRequest::PracticeAdvice {
            sessions: vec![session.clone(), session],
        });
        assert!(prompt.contains("2 session(s), 8000000000 minutes total"));
    }
}
