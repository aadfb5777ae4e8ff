//! One learner working on one exercise: the word bank, the placed slots,
//! live per-slot statuses, and the terminal check that awards points.

use sentence_utils::{Exercise, Level, Token};
use wasm_bindgen::prelude::*;

use crate::advance::AdvanceTimer;
use crate::grading::{self, SlotStatus, Verdict};
use crate::progress::{ProgressEvent, SCORE_REWARD};
use crate::shuffle::{SeededShuffler, Shuffler};

pub const CORRECT_FEEDBACK: &str = "✅ Correct! Great Job!";
pub const INCORRECT_FEEDBACK: &str = "❌ Try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum SessionPhase {
    /// Nothing placed yet.
    Selecting,
    InProgress,
    /// Correctly completed. Placement is frozen until `reset`.
    Complete,
}

/// What a mutation reported back to the host. `event` is present exactly
/// once per checked arrangement; the host appends it to the progress stream.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub struct CheckOutcome {
    pub verdict: Option<Verdict>,
    pub feedback: String,
    pub celebrate: bool,
    pub event: Option<ProgressEvent>,
}

#[wasm_bindgen]
pub struct ExerciseSession {
    level: Level,
    topic: String,
    exercise: Exercise,
    target: Vec<String>,

    available: Vec<Token>,
    placed: Vec<Token>,
    statuses: Vec<SlotStatus>,
    feedback: String,

    score: u32,
    phase: SessionPhase,
    advance: AdvanceTimer,
    shuffler: Box<dyn Shuffler>,
    // Set once a full arrangement has been judged, so re-checking the same
    // arrangement cannot award points or emit a second event. Cleared by
    // any removal.
    verdict_recorded: bool,
}

impl ExerciseSession {
    pub fn with_shuffler(
        level: Level,
        topic: String,
        exercise: Exercise,
        starting_score: u32,
        mut shuffler: Box<dyn Shuffler>,
    ) -> Self {
        let target = exercise.target_words();
        let mut available = exercise.tokens();
        shuffler.shuffle(&mut available);

        Self {
            level,
            topic,
            statuses: vec![SlotStatus::Unfilled; target.len()],
            target,
            exercise,
            available,
            placed: Vec::new(),
            feedback: String::new(),
            score: starting_score,
            phase: SessionPhase::Selecting,
            advance: AdvanceTimer::default(),
            shuffler,
            verdict_recorded: false,
        }
    }
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl ExerciseSession {
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(level: Level, topic: String, exercise: Exercise, starting_score: u32) -> Self {
        Self::with_shuffler(
            level,
            topic,
            exercise,
            starting_score,
            Box::new(SeededShuffler::from_clock()),
        )
    }

    /// Move the token with this tag from the word bank into the next open
    /// slot. Unknown tags, full slots, and completed sessions are silent
    /// no-ops. Filling the final slot judges the arrangement.
    pub fn place_token(&mut self, tag: usize) -> CheckOutcome {
        if self.phase == SessionPhase::Complete || self.placed.len() >= self.target.len() {
            return self.quiet_outcome();
        }
        let Some(found) = self.available.iter().position(|t| t.tag == tag) else {
            return self.quiet_outcome();
        };

        let token = self.available.remove(found);
        self.placed.push(token);
        self.phase = SessionPhase::InProgress;
        self.statuses = grading::slot_statuses(&self.placed, &self.target);

        if self.placed.len() == self.target.len() {
            self.judge()
        } else {
            self.quiet_outcome()
        }
    }

    /// Return the token at `index` and everything after it to the word
    /// bank. Slots always fill left to right, so removal truncates rather
    /// than leaving a hole.
    pub fn remove_token(&mut self, index: usize) {
        if self.phase == SessionPhase::Complete || index >= self.placed.len() {
            return;
        }

        let mut tail = self.placed.split_off(index);
        self.available.append(&mut tail);

        self.statuses = grading::slot_statuses(&self.placed, &self.target);
        self.feedback.clear();
        self.verdict_recorded = false;
        self.advance.cancel();
        if self.placed.is_empty() {
            self.phase = SessionPhase::Selecting;
        }
    }

    /// Re-judge the current arrangement. Does nothing while slots remain
    /// open, and never double-awards an arrangement already judged.
    pub fn check_now(&mut self) -> CheckOutcome {
        if self.placed.len() == self.target.len() {
            self.judge()
        } else {
            self.quiet_outcome()
        }
    }

    /// Same exercise, fresh shuffle, score kept.
    pub fn reset(&mut self) {
        self.available = self.exercise.tokens();
        self.shuffler.shuffle(&mut self.available);
        self.placed.clear();
        self.statuses = vec![SlotStatus::Unfilled; self.target.len()];
        self.feedback.clear();
        self.phase = SessionPhase::Selecting;
        self.advance.cancel();
        self.verdict_recorded = false;
    }

    /// True once the post-completion pause has elapsed. The host polls this
    /// from its render timer and moves to the next exercise.
    pub fn advance_due(&self) -> bool {
        self.advance.is_due()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn available_tokens(&self) -> Vec<Token> {
        self.available.clone()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn placed_tokens(&self) -> Vec<Token> {
        self.placed.clone()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn slot_statuses(&self) -> Vec<SlotStatus> {
        self.statuses.clone()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn feedback(&self) -> String {
        self.feedback.clone()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn level(&self) -> Level {
        self.level
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn topic(&self) -> String {
        self.topic.clone()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn target_len(&self) -> usize {
        self.target.len()
    }

    /// The native-language rendering, revealed only after a correct
    /// completion.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn translation(&self) -> Option<String> {
        if self.phase == SessionPhase::Complete {
            self.exercise.translation.clone()
        } else {
            None
        }
    }
}

impl ExerciseSession {
    fn quiet_outcome(&self) -> CheckOutcome {
        CheckOutcome {
            verdict: None,
            feedback: self.feedback.clone(),
            celebrate: false,
            event: None,
        }
    }

    fn judge(&mut self) -> CheckOutcome {
        let Some(verdict) = grading::terminal_verdict(&self.placed, &self.target) else {
            return self.quiet_outcome();
        };

        if self.verdict_recorded {
            return CheckOutcome {
                verdict: Some(verdict),
                feedback: self.feedback.clone(),
                celebrate: false,
                event: None,
            };
        }
        self.verdict_recorded = true;

        let was_correct = verdict == Verdict::Correct;
        // History records what the learner actually built, not the target.
        let sentence = self
            .placed
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        if was_correct {
            self.score += SCORE_REWARD;
            self.feedback = CORRECT_FEEDBACK.to_string();
            self.phase = SessionPhase::Complete;
            self.advance.arm();
        } else {
            self.feedback = INCORRECT_FEEDBACK.to_string();
        }

        CheckOutcome {
            verdict: Some(verdict),
            feedback: self.feedback.clone(),
            celebrate: was_correct,
            event: Some(ProgressEvent::SentenceCompleted {
                level: self.level,
                topic: self.topic.clone(),
                sentence,
                was_correct,
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn advance_due_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.advance.is_due_at(now)
    }
}
