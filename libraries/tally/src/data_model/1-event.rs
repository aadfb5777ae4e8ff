//! # Event
//! Events are the unit of record. Application state is the result of folding
//! a sequence of events, and events are what goes over the wire and into
//! persistent storage.
//! Stored events must be versionable so the data model can evolve without
//! breaking what is already persisted: implementors are expected to round
//! trip through a versioned envelope type in `to_json`/`from_json`.

pub trait Event: Sized + PartialOrd + Ord + Clone + Eq + PartialEq {
    fn to_json(&self) -> Result<serde_json::Value, serde_json::Error>;
    fn from_json(json: &serde_json::Value) -> Result<Self, serde_json::Error>;
}

/// Failure modes when ingesting events from the host or a remote device.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("malformed event json: {0}")]
    Json(#[from] serde_json::Error),
    /// A device's events must be gapless: the nth event a device creates has
    /// index n. A batch that skips ahead means we lost something.
    #[error("non-contiguous events for device: expected index {expected}, got {got}")]
    NonContiguous { expected: usize, got: usize },
}
