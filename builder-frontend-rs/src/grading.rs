//! Position-wise validation of the learner's sentence against the target.
//! Pure functions; the session calls these after every mutation.

use sentence_utils::Token;
use serde::{Deserialize, Serialize};

/// Per-slot correctness. A slot is `Unfilled` until the learner has placed
/// that many tokens; word order matters, so a correct word in the wrong
/// slot is `Incorrect`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum SlotStatus {
    Correct,
    Incorrect,
    Unfilled,
}

/// The terminal outcome once every slot is filled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, tsify::Tsify)]
#[tsify(into_wasm_abi, from_wasm_abi)]
pub enum Verdict {
    Correct,
    Incorrect,
}

/// One status per target slot: position-wise equality for filled slots,
/// `Unfilled` for the rest. The result always has `target.len()` entries.
pub fn slot_statuses(placed: &[Token], target: &[String]) -> Vec<SlotStatus> {
    target
        .iter()
        .enumerate()
        .map(|(i, expected)| match placed.get(i) {
            Some(token) if token.text == *expected => SlotStatus::Correct,
            Some(_) => SlotStatus::Incorrect,
            None => SlotStatus::Unfilled,
        })
        .collect()
}

/// `Some` only when every slot is filled. Exact sequence equality — an
/// anagram of the right words is `Incorrect`.
pub fn terminal_verdict(placed: &[Token], target: &[String]) -> Option<Verdict> {
    if placed.len() != target.len() {
        return None;
    }
    let all_match = placed
        .iter()
        .zip(target.iter())
        .all(|(token, expected)| token.text == *expected);
    Some(if all_match {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    })
}
