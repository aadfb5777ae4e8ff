//! An append-only event engine for per-user progress tracking.
//!
//! Instead of mutating a score or a history list in place, the app records
//! "events". Each event is tagged with the device that produced it, a
//! timestamp, and a per-device sequence index. The current state (score,
//! completion history, anything derivable) is a fold over the merged event
//! streams in chronological order.
//!
//! This buys the properties a hosted-storage app needs for free:
//! - writes from different devices can arrive late or out of order; the
//!   merge puts them back in timestamp order,
//! - history is append-only by construction,
//! - a failed upload never corrupts local state, it just leaves events
//!   unsynced until the next push.
//!
//! The engine is transport-agnostic. The host is expected to shuttle event
//! JSON to and from whatever document store it uses, driven by the vector
//! clocks exposed here.

pub mod data_model;

use crate::data_model::{Event, Timestamped};

pub trait AppState: Sized {
    type Event: Event;

    fn apply_event(self, event: &Timestamped<Self::Event>) -> Self;
}
