mod advance;
mod grading;
mod local_score;
mod progress;
mod session;
mod shuffle;
mod utils;

use std::cell::RefCell;
use std::sync::Arc;
use std::sync::LazyLock;

use sentence_utils::{Curriculum, Level, SentenceRecord};
use tally::data_model::{Clock, Event, EventStore, ListenerKey};
use wasm_bindgen::prelude::*;

pub use advance::{AUTO_ADVANCE_DELAY_MS, AdvanceTimer};
pub use grading::{SlotStatus, Verdict, slot_statuses, terminal_verdict};
pub use progress::{ChartPoint, CompletionRecord, Progress, ProgressEvent, SCORE_REWARD};
pub use session::{CheckOutcome, ExerciseSession, SessionPhase};
pub use shuffle::{SeededShuffler, Shuffler};

/// The one event stream this app records.
const PROGRESS_STREAM: &str = "progress";

// putting this inside LOGGER prevents us from accidentally initializing the logger more than once
#[allow(clippy::declare_interior_mutable_const)]
const LOGGER: LazyLock<()> = LazyLock::new(|| {
    utils::set_panic_hook();

    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Logging initialized");
});

/// The app object the host holds for the lifetime of the page: the event
/// store behind the score and history, plus the current curriculum.
///
/// We never hold a store borrow while calling back into JS; listeners are
/// drained into closures first and invoked after the borrow is released.
#[wasm_bindgen]
pub struct Tally {
    store: RefCell<EventStore<String, String, ProgressEvent>>,
    user_id: Option<String>,
    device_id: String,
    // Guests have no document store, so events from earlier visits are
    // gone; the score they earned arrives as this baseline instead.
    // Always 0 for signed-in users.
    guest_score_baseline: u32,
    curriculum: RefCell<Arc<Curriculum>>,
}

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
impl Tally {
    /// `sync_stream` is called whenever a stream changes for a reason its
    /// subscriber did not cause, letting the host push fresh events to its
    /// document store.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(constructor))]
    pub fn new(user_id: Option<String>, sync_stream: js_sys::Function) -> Self {
        // used to only initialize the logger once
        #[allow(clippy::borrow_interior_mutable_const)]
        *LOGGER;

        let device_id = utils::get_or_create_device_id();
        let guest_score_baseline = if user_id.is_none() {
            local_score::load().unwrap_or(0)
        } else {
            0
        };

        let mut events: EventStore<String, String, ProgressEvent> = EventStore::default();
        events.register_listener(move |listener_id, stream_id| {
            #[cfg(target_arch = "wasm32")]
            {
                let this = JsValue::null();
                let listener_js: JsValue = listener_id.into();
                let stream_js = JsValue::from_str(&stream_id);
                let _ = sync_stream.call2(&this, &listener_js, &stream_js);
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                let _ = (listener_id, &sync_stream, stream_id);
            }
        });

        Self {
            store: RefCell::new(events),
            user_id,
            device_id,
            guest_score_baseline,
            curriculum: RefCell::new(Arc::new(Curriculum::seed())),
        }
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn subscribe_to_stream(
        &self,
        stream_id: String,
        callback: js_sys::Function,
    ) -> ListenerKey {
        let _flusher = FlushLater::new(self);

        self.store
            .borrow_mut()
            .register_listener(move |_, event_stream_id| {
                if event_stream_id == stream_id {
                    #[cfg(target_arch = "wasm32")]
                    {
                        let this = JsValue::null();
                        let _ = callback.call0(&this);
                    }
                    #[cfg(not(target_arch = "wasm32"))]
                    let _ = &callback;
                }
            })
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn unsubscribe(&self, key: ListenerKey) {
        self.store.borrow_mut().unregister_listener(key)
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn request_progress(&self) {
        let _flusher = FlushLater::new(self); // The addition of a new stream can trigger listeners, so we want to make sure to flush them after.
        self.store
            .borrow_mut()
            .get_or_insert_default(PROGRESS_STREAM.to_string(), None);
    }

    pub fn get_progress_state(&self) -> Progress {
        let store = self.store.borrow();
        store
            .get(&PROGRESS_STREAM.to_string())
            .map(|stream| stream.state(Progress::default()))
            .unwrap_or_default()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn progress_loaded(&self) -> bool {
        self.store
            .borrow()
            .loaded_at_least_once(&PROGRESS_STREAM.to_string())
    }

    /// Call after the initial download from the document store has been
    /// applied (even if it was empty), so the UI can stop showing a spinner.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn mark_progress_loaded(&self) {
        let changed = self
            .store
            .borrow_mut()
            .mark_loaded(&PROGRESS_STREAM.to_string(), None);
        if changed {
            self.flush_notifications();
        }
    }

    pub fn add_progress_event(&self, event: ProgressEvent) {
        self.store.borrow_mut().add_raw_event(
            PROGRESS_STREAM.to_string(),
            self.device_id.clone(),
            event,
            None,
        );
        self.flush_notifications();

        // Guests have no document store; mirror the score they can see
        // (pre-reload baseline plus everything recorded this visit) so it
        // survives the next reload.
        if self.user_id.is_none() {
            local_score::save(self.guest_score_baseline + self.get_progress_state().score);
        }
    }

    /// Merge one event downloaded from the document store. The event JSON
    /// is the versioned envelope produced by `events_json`.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn add_remote_event(
        &self,
        device_id: String,
        stream_id: String,
        event: String,
    ) -> Result<(), JsValue> {
        let event: serde_json::Value =
            serde_json::from_str(&event).map_err(|e| JsValue::from_str(&format!("{e:?}")))?;

        self.store
            .borrow_mut()
            .add_wire_event(stream_id, device_id, &event, None)
            .map_err(|e| JsValue::from_str(&format!("{e:?}")))?;
        self.flush_notifications();
        Ok(())
    }

    /// This store's vector clock, for the host to hand to the remote.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn clock_json(&self) -> Result<String, JsValue> {
        let clock = self.store.borrow().vector_clock();
        serde_json::to_string(&clock).map_err(|e| JsValue::from_str(&format!("{e:?}")))
    }

    /// Everything the remote (described by its clock JSON) has not seen,
    /// as `[{stream, device, event}]` ready for upload.
    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn events_json(&self, remote_clock: String) -> Result<String, JsValue> {
        let remote: Clock<String, String> = serde_json::from_str(&remote_clock)
            .map_err(|e| JsValue::from_str(&format!("{e:?}")))?;

        let mut rows = Vec::new();
        for (stream, device, event) in self.store.borrow().events_missing_from(&remote) {
            let event = event
                .to_json()
                .map_err(|e| JsValue::from_str(&format!("{e:?}")))?;
            rows.push(serde_json::json!({
                "stream": stream,
                "device": device,
                "event": event,
            }));
        }
        serde_json::to_string(&rows).map_err(|e| JsValue::from_str(&format!("{e:?}")))
    }

    /// Replace the curriculum with admin-managed records. An empty fetch
    /// falls back to the built-in starter content.
    pub fn set_content(&self, records: Vec<SentenceRecord>) {
        let mut curriculum = Curriculum::from_records(records);
        if curriculum.is_empty() {
            curriculum = Curriculum::seed();
        }
        *self.curriculum.borrow_mut() = Arc::new(curriculum);
    }

    /// `None` when the (level, topic) pair is not in the curriculum; the
    /// host should keep its selection UI rather than open a broken session.
    pub fn new_session(&self, level: Level, topic: String) -> Option<ExerciseSession> {
        let curriculum = self.curriculum.borrow().clone();
        let exercise = curriculum.exercise_for(level, &topic)?.clone();

        // The same sum the guest mirror persists, so the session never
        // shows a score that storage will contradict.
        let starting_score = self.guest_score_baseline + self.get_progress_state().score;

        Some(ExerciseSession::new(level, topic, exercise, starting_score))
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn levels(&self) -> Vec<Level> {
        self.curriculum.borrow().levels().collect()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
    pub fn topics_for(&self, level: Level) -> Vec<String> {
        self.curriculum
            .borrow()
            .topics_for(level)
            .map(str::to_string)
            .collect()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn num_events(&self) -> usize {
        self.store
            .borrow()
            .vector_clock()
            .values()
            .map(|device_counts| device_counts.values().sum::<usize>())
            .sum()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn user_id(&self) -> Option<String> {
        self.user_id.clone()
    }

    #[cfg_attr(target_arch = "wasm32", wasm_bindgen(getter))]
    pub fn device_id(&self) -> String {
        self.device_id.clone()
    }
}

impl Tally {
    /// Flush pending store/stream notifications safely, avoiding RefCell re-borrows during callbacks.
    fn flush_notifications(&self) {
        // do it like this to avoid holding the borrow while we call the callbacks
        let notifications = self.store.borrow_mut().drain_due_notifications();
        // that's important because many of these callbacks will call back into rust functions that themselves do borrow_mut()
        for notification in notifications {
            notification();
        }
    }
}

/// Flushes event listeners when dropped, so a function can't forget to
/// flush on one of its return paths.
struct FlushLater<'a> {
    tally: &'a Tally,
}

impl<'a> FlushLater<'a> {
    fn new(tally: &'a Tally) -> Self {
        Self { tally }
    }
}

impl<'a> Drop for FlushLater<'a> {
    fn drop(&mut self) {
        self.tally.flush_notifications();
    }
}

#[wasm_bindgen]
pub fn app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use sentence_utils::Exercise;

    fn store() -> EventStore<String, String, ProgressEvent> {
        EventStore::default()
    }

    fn completed(was_correct: bool) -> ProgressEvent {
        ProgressEvent::SentenceCompleted {
            level: Level::A1,
            topic: "Present Simple".to_string(),
            sentence: "I wake up at 7 a.m.".to_string(),
            was_correct,
        }
    }

    fn progress_of(store: &EventStore<String, String, ProgressEvent>) -> Progress {
        store
            .get(&PROGRESS_STREAM.to_string())
            .map(|stream| stream.state(Progress::default()))
            .unwrap_or_default()
    }

    // `Tally::new` wants a js_sys::Function, which only exists in a JS
    // runtime; native tests assemble the same parts by hand.
    fn guest_tally() -> Tally {
        Tally {
            store: RefCell::new(EventStore::default()),
            user_id: None,
            device_id: "test-device".to_string(),
            guest_score_baseline: local_score::load().unwrap_or(0),
            curriculum: RefCell::new(Arc::new(Curriculum::seed())),
        }
    }

    #[test]
    fn guest_score_survives_a_reload_then_completion() {
        let _lock = local_score::STORE_LOCK.lock().unwrap();

        // An earlier visit left 50 points behind; a fresh page load starts
        // with an empty event store.
        local_score::save(50);
        let tally = guest_tally();

        let mut session = tally
            .new_session(Level::A1, "Present Simple".to_string())
            .unwrap();
        assert_eq!(session.score(), 50);

        let mut outcome = None;
        for tag in 0..6 {
            outcome = Some(session.place_token(tag));
        }
        let outcome = outcome.unwrap();
        assert_eq!(outcome.verdict, Some(Verdict::Correct));
        assert_eq!(session.score(), 60);

        tally.add_progress_event(outcome.event.unwrap());

        // The mirror holds what the learner saw, not just this visit's
        // events.
        assert_eq!(local_score::load(), Some(60));
    }

    #[test]
    fn empty_content_fetch_falls_back_to_seed() {
        let tally = guest_tally();

        tally.set_content(vec![SentenceRecord {
            level: Level::B2,
            topic: "Passive".to_string(),
            words: ["The", "bridge", "was", "built"].map(String::from).to_vec(),
            correct: "The bridge was built.".to_string(),
            translation: None,
        }]);
        assert_eq!(tally.levels(), vec![Level::B2]);

        tally.set_content(Vec::new());
        assert_eq!(tally.levels(), vec![Level::A1, Level::A2]);
        assert!(tally.new_session(Level::B2, "Passive".to_string()).is_none());
    }

    #[test]
    fn recorded_completions_fold_into_the_score() {
        let mut store = store();
        store.add_raw_event(
            PROGRESS_STREAM.to_string(),
            "laptop".to_string(),
            completed(true),
            None,
        );
        store.add_raw_event(
            PROGRESS_STREAM.to_string(),
            "laptop".to_string(),
            completed(false),
            None,
        );
        store.add_raw_event(
            PROGRESS_STREAM.to_string(),
            "laptop".to_string(),
            completed(true),
            None,
        );

        let progress = progress_of(&store);
        assert_eq!(progress.score, 20);
        assert_eq!(progress.total_attempts, 3);
        assert_eq!(progress.completions.len(), 3);
    }

    #[test]
    fn remote_events_merge_through_the_wire_format() {
        let mut laptop = store();
        laptop.add_raw_event(
            PROGRESS_STREAM.to_string(),
            "laptop".to_string(),
            completed(true),
            None,
        );

        // Ship everything the phone has not seen over JSON, like the host
        // sync loop does.
        let mut phone = store();
        for (stream, device, event) in laptop.events_missing_from(&phone.vector_clock()) {
            let json = event.to_json().unwrap();
            phone.add_wire_event(stream, device, &json, None).unwrap();
        }

        assert_eq!(progress_of(&phone).score, 10);
        assert!(laptop.events_missing_from(&phone.vector_clock()).is_empty());
    }

    #[test]
    fn a_full_session_feeds_the_progress_stream() {
        let exercise = Exercise {
            words: ["She", "went", "to", "the", "park", "yesterday"]
                .map(String::from)
                .to_vec(),
            correct: "She went to the park yesterday.".to_string(),
            translation: None,
        };
        let mut session = ExerciseSession::with_shuffler(
            Level::A1,
            "Past Simple".to_string(),
            exercise.clone(),
            0,
            Box::new(crate::shuffle::FixedOrder(vec![0, 1, 2, 3, 4, 5])),
        );

        let mut store = store();
        let mut last = None;
        for tag in 0..exercise.words.len() {
            last = Some(session.place_token(tag));
        }
        // The final placement completes with "yesterday" where the target
        // says "yesterday." so the attempt reads incorrect.
        let outcome = last.unwrap();
        assert_eq!(outcome.verdict, Some(Verdict::Incorrect));
        if let Some(event) = outcome.event {
            store.add_raw_event(
                PROGRESS_STREAM.to_string(),
                "laptop".to_string(),
                event,
                None,
            );
        }

        let progress = progress_of(&store);
        assert_eq!(progress.score, 0);
        assert_eq!(progress.total_attempts, 1);
        assert!(!progress.completions[0].was_correct);
    }
}
