#[path = "1-event.rs"]
mod event;

#[path = "2-event-type.rs"]
mod event_type;

#[path = "3-timestamped.rs"]
mod timestamped;

#[path = "4-event-stream-store.rs"]
mod event_stream_store;

#[path = "5-change-tracker.rs"]
mod change_tracker;

#[path = "6-event-store.rs"]
mod event_store;

pub use change_tracker::*;
pub use event::*;
pub use event_store::*;
pub use event_stream_store::*;
pub use event_type::*;
pub use timestamped::*;

#[cfg_attr(target_arch = "wasm32", wasm_bindgen::prelude::wasm_bindgen)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct ListenerKey(pub(crate) slotmap::DefaultKey);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppState;
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
    struct Bump(u32);

    impl crate::Event for Bump {
        fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
            serde_json::to_value(self)
        }

        fn from_json(json: &serde_json::Value) -> Result<Self, serde_json::Error> {
            serde_json::from_value(json.clone())
        }
    }

    #[derive(Debug, PartialEq)]
    struct Total(u32);

    impl AppState for Total {
        type Event = Bump;

        fn apply_event(self, event: &Timestamped<Self::Event>) -> Self {
            Total(self.0 + event.event.0)
        }
    }

    fn stamped(secs: i64, index: usize, amount: u32) -> Timestamped<EventType<Bump>> {
        Timestamped {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            within_device_events_index: index,
            event: EventType::User(Bump(amount)),
        }
    }

    #[test]
    fn empty_stream_yields_nothing() {
        let events: EventStreamStore<String, i32> = EventStreamStore::default();
        let collected: Vec<i32> = events.iter().cloned().collect();
        assert_eq!(collected, Vec::<i32>::new());
    }

    #[test]
    fn single_device_events_come_out_sorted() {
        let mut events: EventStreamStore<String, i32> = EventStreamStore::default();
        events.add_event_unchecked("laptop", 3);
        events.add_event_unchecked("laptop", 1);
        events.add_event_unchecked("laptop", 2);

        let collected: Vec<_> = events.iter().cloned().collect();
        assert_eq!(collected, vec![1, 2, 3]);
    }

    #[test]
    fn devices_are_merged_into_one_order() {
        let mut events: EventStreamStore<String, i32> = EventStreamStore::default();
        events.add_event_unchecked("laptop", 1);
        events.add_event_unchecked("phone", 4);
        events.add_event_unchecked("laptop", 5);
        events.add_event_unchecked("phone", 2);
        events.add_event_unchecked("tablet", 0);

        let collected: Vec<_> = events.iter().cloned().collect();
        assert_eq!(collected, vec![0, 1, 2, 4, 5]);
    }

    #[test]
    fn duplicates_within_a_device_are_dropped_but_not_across() {
        let mut events: EventStreamStore<String, i32> = EventStreamStore::default();
        events.add_event_unchecked("laptop", 1);
        events.add_event_unchecked("laptop", 1);
        events.add_event_unchecked("phone", 1);

        let collected: Vec<_> = events.iter().cloned().collect();
        assert_eq!(collected, vec![1, 1]);
    }

    #[test]
    fn overlapping_resync_adds_only_fresh_events() {
        let mut events: EventStreamStore<String, Timestamped<EventType<Bump>>> =
            EventStreamStore::default();
        let batch = vec![stamped(10, 0, 1), stamped(20, 1, 2)];
        assert_eq!(
            events.add_device_events("phone".to_string(), batch).unwrap(),
            2
        );

        // A re-sync repeats the old events plus one new one.
        let batch = vec![stamped(10, 0, 1), stamped(20, 1, 2), stamped(30, 2, 3)];
        assert_eq!(
            events.add_device_events("phone".to_string(), batch).unwrap(),
            1
        );
        assert_eq!(events.num_events(), 3);
    }

    #[test]
    fn gapped_batch_is_rejected() {
        let mut events: EventStreamStore<String, Timestamped<EventType<Bump>>> =
            EventStreamStore::default();
        let err = events
            .add_device_events("phone".to_string(), vec![stamped(10, 1, 1)])
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NonContiguous {
                expected: 0,
                got: 1
            }
        ));
        assert_eq!(events.num_events(), 0);
    }

    #[test]
    fn state_folds_in_timestamp_order_across_devices() {
        let mut events: EventStreamStore<String, Timestamped<EventType<Bump>>> =
            EventStreamStore::default();
        // Phone events arrive after laptop events despite older timestamps.
        events
            .add_device_events(
                "laptop".to_string(),
                vec![stamped(100, 0, 10), stamped(300, 1, 1)],
            )
            .unwrap();
        events
            .add_device_events("phone".to_string(), vec![stamped(200, 0, 100)])
            .unwrap();

        assert_eq!(events.state(Total(0)), Total(111));
    }

    #[test]
    fn missing_events_follow_the_clock() {
        let mut store: EventStore<String, String, Bump> = EventStore::default();
        store.add_raw_event("progress".to_string(), "laptop".to_string(), Bump(1), None);
        store.add_raw_event("progress".to_string(), "laptop".to_string(), Bump(2), None);

        let nothing_synced = Clock::default();
        assert_eq!(store.events_missing_from(&nothing_synced).len(), 2);

        let fully_synced = store.vector_clock();
        assert_eq!(store.events_missing_from(&fully_synced).len(), 0);
    }

    #[test]
    fn listeners_fire_once_per_change_and_skip_the_modifier() {
        let mut store: EventStore<String, String, Bump> = EventStore::default();

        let hits = Rc::new(RefCell::new(Vec::new()));
        let hits_clone = hits.clone();
        let key = store.register_listener(move |_, stream| {
            hits_clone.borrow_mut().push(stream);
        });

        store.add_raw_event("progress".to_string(), "laptop".to_string(), Bump(1), None);
        for notify in store.drain_due_notifications() {
            notify();
        }
        assert_eq!(hits.borrow().as_slice(), ["progress".to_string()]);

        // Drained: nothing further pending.
        assert!(store.drain_due_notifications().is_empty());

        // A change made *by* the listener does not bounce back to it.
        store.add_raw_event(
            "progress".to_string(),
            "laptop".to_string(),
            Bump(2),
            Some(key),
        );
        assert!(store.drain_due_notifications().is_empty());
    }

    #[test]
    fn malformed_wire_event_is_rejected_as_json() {
        let mut store: EventStore<String, String, Bump> = EventStore::default();
        let err = store
            .add_wire_event(
                "progress".to_string(),
                "laptop".to_string(),
                &serde_json::json!({ "unexpected": true }),
                None,
            )
            .unwrap_err();

        assert!(matches!(err, StoreError::Json(_)));
        assert_eq!(store.vector_clock(), Clock::default());
    }

    #[test]
    fn wire_events_ingest_through_the_envelope() {
        let mut store: EventStore<String, String, Bump> = EventStore::default();
        let json = crate::Event::to_json(&stamped(42, 0, 7)).unwrap();

        let added = store
            .add_wire_event("progress".to_string(), "laptop".to_string(), &json, None)
            .unwrap();
        assert_eq!(added, 1);
    }

    #[test]
    fn wire_round_trip_preserves_the_event() {
        use crate::Event as _;

        let event = stamped(42, 0, 7);
        let json = event.to_json().unwrap();
        let back = Timestamped::<EventType<Bump>>::from_json(&json).unwrap();
        assert_eq!(event, back);
    }
}
