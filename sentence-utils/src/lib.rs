//! Shared data model for the sentence builder: proficiency levels, exercises,
//! word-bank tokens, the admin-managed sentence record shape, and the
//! curriculum catalog that organizes exercises by level and topic.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// CEFR-style proficiency level. The admin panel stores these as their
/// display strings, so the serde names are the display names.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::A1, Level::A2, Level::B1, Level::B2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::A1 => "A1",
            Level::A2 => "A2",
            Level::B1 => "B1",
            Level::B2 => "B2",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One word-bank entry. Two tokens can share display text (a sentence may
/// contain the same word twice), so identity is the `tag`: the token's
/// origin index in the exercise's word list. Moving tokens by tag removes
/// exactly one instance of a duplicated word.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Token {
    pub tag: usize,
    pub text: String,
}

/// A single exercise: the word bank (pre-shuffle), the correct sentence, and
/// an optional native-language translation shown on success. Immutable once
/// in the curriculum.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Exercise {
    pub words: Vec<String>,
    pub correct: String,
    pub translation: Option<String>,
}

impl Exercise {
    /// The target sentence as word slots.
    pub fn target_words(&self) -> Vec<String> {
        self.correct.split(' ').map(str::to_string).collect()
    }

    pub fn target_len(&self) -> usize {
        self.correct.split(' ').count()
    }

    /// The word bank with stable per-instance identities attached.
    pub fn tokens(&self) -> Vec<Token> {
        self.words
            .iter()
            .enumerate()
            .map(|(tag, text)| Token {
                tag,
                text: text.clone(),
            })
            .collect()
    }
}

/// The persisted document shape the admin panel manages: one row of the
/// `sentences` collection. Read-only from the practice core's perspective.
#[derive(
    Clone,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    tsify::Tsify,
    schemars::JsonSchema,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct SentenceRecord {
    pub level: Level,
    pub topic: String,
    pub words: Vec<String>,
    pub correct: String,
    pub translation: Option<String>,
}

/// The catalog of exercises, level → topic → exercise. Insertion order is
/// display order, for both levels and topics.
#[derive(Clone, Debug, Default)]
pub struct Curriculum {
    levels: IndexMap<Level, IndexMap<String, Exercise>>,
}

impl Curriculum {
    /// The built-in starter content.
    pub fn seed() -> Self {
        Self::from_records(seed_records())
    }

    pub fn from_records(records: Vec<SentenceRecord>) -> Self {
        let mut curriculum = Self::default();
        curriculum.merge_records(records);
        curriculum
    }

    /// Fold admin-fetched records in. A record for an existing
    /// (level, topic) pair replaces that exercise; new pairs append in
    /// record order.
    pub fn merge_records(&mut self, records: Vec<SentenceRecord>) {
        for record in records {
            let SentenceRecord {
                level,
                topic,
                words,
                correct,
                translation,
            } = record;
            self.levels.entry(level).or_default().insert(
                topic,
                Exercise {
                    words,
                    correct,
                    translation,
                },
            );
        }
    }

    /// `None` is the defined not-found signal; selection UIs only offer
    /// level/topic pairs drawn from this catalog, so hitting it means the
    /// caller should fail closed rather than load anything.
    pub fn exercise_for(&self, level: Level, topic: &str) -> Option<&Exercise> {
        self.levels.get(&level)?.get(topic)
    }

    pub fn levels(&self) -> impl Iterator<Item = Level> + '_ {
        self.levels.keys().copied()
    }

    pub fn topics_for(&self, level: Level) -> impl Iterator<Item = &str> + '_ {
        self.levels
            .get(&level)
            .into_iter()
            .flat_map(|topics| topics.keys().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// The starter sentence sets, matching the hosted `sentences` collection's
/// defaults. Translations are Turkish, the app's original audience.
pub fn seed_records() -> Vec<SentenceRecord> {
    vec![
        SentenceRecord {
            level: Level::A1,
            topic: "Present Simple".to_string(),
            words: ["I", "wake", "up", "at", "7", "a.m."]
                .map(String::from)
                .to_vec(),
            correct: "I wake up at 7 a.m.".to_string(),
            translation: Some("Ben saat 7'de uyanırım.".to_string()),
        },
        SentenceRecord {
            level: Level::A1,
            topic: "Past Simple".to_string(),
            words: ["She", "went", "to", "the", "park", "yesterday"]
                .map(String::from)
                .to_vec(),
            correct: "She went to the park yesterday.".to_string(),
            translation: Some("O dün parka gitti.".to_string()),
        },
        SentenceRecord {
            level: Level::A2,
            topic: "Future Simple".to_string(),
            words: ["We", "will", "travel", "to", "Istanbul", "tomorrow"]
                .map(String::from)
                .to_vec(),
            correct: "We will travel to Istanbul tomorrow.".to_string(),
            translation: Some("Yarın İstanbul'a seyahat edeceğiz.".to_string()),
        },
    ]
}
