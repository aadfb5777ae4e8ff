//! The progress stream: what gets recorded when a sentence is completed,
//! and the state folded out of it (score, completion history, chart data).

use chrono::{DateTime, NaiveDate, Utc};
use sentence_utils::Level;
use tally::data_model::Event;

/// Points awarded for each correctly completed sentence.
pub const SCORE_REWARD: u32 = 10;

#[derive(
    Clone, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, Ord, PartialOrd, tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum ProgressEvent {
    SentenceCompleted {
        level: Level,
        topic: String,
        sentence: String,
        was_correct: bool,
    },
}

#[derive(
    Clone, Debug, serde::Serialize, serde::Deserialize, Ord, PartialOrd, Eq, PartialEq, tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(tag = "version")]
pub enum VersionedProgressEvent {
    V1(ProgressEvent),
}

impl Event for ProgressEvent {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        let versioned = VersionedProgressEvent::from(self.clone());
        serde_json::to_value(versioned)
    }

    fn from_json(json: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value::<VersionedProgressEvent>(json.clone())
            .map(|versioned| versioned.into())
    }
}

impl From<ProgressEvent> for VersionedProgressEvent {
    fn from(event: ProgressEvent) -> Self {
        VersionedProgressEvent::V1(event)
    }
}

impl From<VersionedProgressEvent> for ProgressEvent {
    fn from(event: VersionedProgressEvent) -> Self {
        match event {
            VersionedProgressEvent::V1(event) => event,
        }
    }
}

/// One row of the learner's history view, newest last.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct CompletionRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub topic: String,
    pub sentence: String,
    pub was_correct: bool,
}

/// Everything derivable from the progress stream. Rebuilt by folding, never
/// mutated directly, so late-arriving events from another device cannot
/// leave it inconsistent.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct Progress {
    pub score: u32,
    pub completions: Vec<CompletionRecord>,
    pub total_attempts: u32,
}

impl tally::AppState for Progress {
    type Event = ProgressEvent;

    fn apply_event(mut self, event: &tally::data_model::Timestamped<Self::Event>) -> Self {
        let ProgressEvent::SentenceCompleted {
            level,
            topic,
            sentence,
            was_correct,
        } = &event.event;

        self.total_attempts += 1;
        if *was_correct {
            self.score += SCORE_REWARD;
        }
        self.completions.push(CompletionRecord {
            timestamp: event.timestamp,
            level: *level,
            topic: topic.clone(),
            sentence: sentence.clone(),
            was_correct: *was_correct,
        });
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct ChartPoint {
    pub day: NaiveDate,
    pub cumulative_completions: u32,
}

impl Progress {
    /// Cumulative correct completions per day, for the dashboard chart.
    /// Days with no activity are absent; the chart draws a step.
    pub fn chart_points(&self) -> Vec<ChartPoint> {
        let mut points: Vec<ChartPoint> = Vec::new();
        let mut running = 0u32;
        for record in self.completions.iter().filter(|r| r.was_correct) {
            running += 1;
            let day = record.timestamp.date_naive();
            match points.last_mut() {
                Some(last) if last.day == day => last.cumulative_completions = running,
                _ => points.push(ChartPoint {
                    day,
                    cumulative_completions: running,
                }),
            }
        }
        points
    }
}
