use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::Arc;

use crate::data_model::{
    ChangeTracked, EventStreamStore, EventType, ListenerKey, MarkOnWrite, PendingNotify,
    StoreError, Timestamped,
};

/// All event streams for one user, plus the listener registry that lets the
/// UI react to changes. Streams are identified by `Stream` (a name like
/// "progress"), events within a stream by the `Device` that created them.
pub struct EventStore<Stream: Eq + Hash + Clone, Device: Ord + Clone, E: crate::Event> {
    streams: HashMap<Stream, ChangeTracked<EventStreamStore<Device, Timestamped<EventType<E>>>>>,
    listeners: slotmap::SlotMap<slotmap::DefaultKey, Arc<dyn Fn(ListenerKey, Stream)>>,
}

impl<Stream: Eq + Hash + Clone, Device: Ord + Clone, E: crate::Event> Default
    for EventStore<Stream, Device, E>
{
    fn default() -> Self {
        Self {
            streams: HashMap::new(),
            listeners: Default::default(),
        }
    }
}

/// How many events each device has contributed to each stream. Two stores
/// can work out what the other is missing by comparing clocks.
pub type Clock<Stream, Device> = BTreeMap<Stream, BTreeMap<Device, usize>>;

impl<Stream: Eq + Hash + Clone + 'static, Device: Ord + Clone + 'static, E: crate::Event>
    EventStore<Stream, Device, E>
{
    /// Collect the notifications owed to listeners and reset the change
    /// flags. The closures are returned rather than invoked so the caller
    /// can drop any store borrow first.
    pub fn drain_due_notifications(&mut self) -> Vec<Box<dyn FnOnce()>> {
        let mut notifications: Vec<Box<dyn FnOnce()>> = Vec::new();
        for (stream_id, stream) in self.streams.iter_mut() {
            let exclude_key = match &stream.pending {
                PendingNotify::Idle => continue,
                PendingNotify::AllExcept(key) => Some(*key),
                PendingNotify::All => None,
            };

            stream.pending = PendingNotify::Idle;

            for (key, listener) in self.listeners.iter() {
                let listener_key = ListenerKey(key);
                if exclude_key == Some(listener_key) {
                    continue;
                }
                let listener = listener.clone();
                let stream_id = stream_id.clone();
                notifications.push(Box::new(move || listener(listener_key, stream_id)));
            }
        }
        notifications
    }

    /// The listener is invoked whenever a stream it did not itself modify
    /// changes (and when a new stream appears).
    pub fn register_listener(
        &mut self,
        listener: impl Fn(ListenerKey, Stream) + 'static,
    ) -> ListenerKey {
        ListenerKey(self.listeners.insert(Arc::new(listener)))
    }

    pub fn unregister_listener(&mut self, token: ListenerKey) {
        self.listeners.remove(token.0);
    }
}

impl<Stream: Eq + Hash + Clone, Device: Ord + Clone, E: crate::Event>
    EventStore<Stream, Device, E>
{
    pub fn get(
        &self,
        stream: &Stream,
    ) -> Option<&EventStreamStore<Device, Timestamped<EventType<E>>>> {
        self.streams.get(stream).map(|s| s.store())
    }

    pub fn get_or_insert_default(
        &mut self,
        stream: Stream,
        modifier: Option<ListenerKey>,
    ) -> MarkOnWrite<'_, EventStreamStore<Device, Timestamped<EventType<E>>>> {
        self.streams
            .entry(stream)
            .or_default()
            .store_mut(modifier)
    }

    pub fn loaded_at_least_once(&self, stream: &Stream) -> bool {
        self.streams
            .get(stream)
            .map(|s| s.loaded_at_least_once())
            .unwrap_or(false)
    }

    /// Returns true if the `loaded` marker was changed.
    pub fn mark_loaded(&mut self, stream: &Stream, modifier: Option<ListenerKey>) -> bool {
        let Some(stream) = self.streams.get_mut(stream) else {
            return false;
        };

        stream.mark_loaded(modifier)
    }
}

impl<Stream: Eq + Hash + Clone + Ord, Device: Ord + Clone, E: crate::Event>
    EventStore<Stream, Device, E>
{
    /// Append a batch from one device, validating per-device contiguity.
    /// Returns how many events were actually new (re-syncs overlap freely).
    pub fn add_device_events(
        &mut self,
        stream: Stream,
        device: Device,
        events: Vec<Timestamped<EventType<E>>>,
        modifier: Option<ListenerKey>,
    ) -> Result<usize, StoreError> {
        let store = self.get_or_insert_default(stream, modifier);

        let fresh = store.valid_to_add_events(&device, events)?;
        if fresh.is_empty() {
            return Ok(0);
        }

        // Only take the mutable deref (which schedules notifications) once
        // we know there is something to write.
        let mut store = store;
        store.add_device_events(device, fresh)
    }

    pub fn add_device_event(
        &mut self,
        stream: Stream,
        device: Device,
        event: Timestamped<EventType<E>>,
        modifier: Option<ListenerKey>,
    ) -> Result<usize, StoreError> {
        self.add_device_events(stream, device, vec![event], modifier)
    }

    /// Decode one event arriving off the wire and append it. A malformed
    /// envelope is a `StoreError::Json`; nothing is written.
    pub fn add_wire_event(
        &mut self,
        stream: Stream,
        device: Device,
        json: &serde_json::Value,
        modifier: Option<ListenerKey>,
    ) -> Result<usize, StoreError> {
        let event = <Timestamped<EventType<E>> as crate::Event>::from_json(json)?;
        self.add_device_event(stream, device, event, modifier)
    }

    /// Stamp and append an event created on this device right now.
    pub fn add_raw_event(
        &mut self,
        stream: Stream,
        device: Device,
        event: E,
        modifier: Option<ListenerKey>,
    ) {
        let event = Timestamped {
            event: EventType::User(event),
            timestamp: chrono::Utc::now(),
            within_device_events_index: self
                .get_or_insert_default(stream.clone(), modifier)
                .len_device(&device),
        };

        // Contiguity cannot fail: the index was read from this store.
        if let Err(e) = self.add_device_event(stream, device, event, modifier) {
            log::error!("failed to append freshly stamped event: {e}");
        }
    }

    pub fn vector_clock(&self) -> Clock<Stream, Device> {
        self.streams
            .iter()
            .map(|(stream, tracked)| {
                (
                    stream.clone(),
                    tracked
                        .store()
                        .num_events_per_device()
                        .into_iter()
                        .map(|(device, count)| (device.clone(), count))
                        .collect(),
                )
            })
            .collect()
    }

    /// Everything a remote holding `remote` has not seen yet, ready for
    /// upload. Order within the result is unspecified; the remote's merge
    /// re-orders by timestamp anyway.
    pub fn events_missing_from(
        &self,
        remote: &Clock<Stream, Device>,
    ) -> Vec<(Stream, Device, Timestamped<EventType<E>>)> {
        let mut missing = Vec::new();
        for (stream_id, tracked) in &self.streams {
            let default_counts = BTreeMap::new();
            let remote_counts = remote.get(stream_id).unwrap_or(&default_counts);
            for (device, event) in tracked.store().events_missing_from(remote_counts) {
                missing.push((stream_id.clone(), device.clone(), event.clone()));
            }
        }
        missing
    }
}
