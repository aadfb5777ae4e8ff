//! # EventStreamStore
//! One stream's events, bucketed per device. Within a device, events live in
//! a `BTreeSet`, which deduplicates re-synced events and keeps them sorted.
//! Iteration merges all devices into one chronological sequence (the derived
//! `Ord` on `Timestamped` sorts by timestamp first).

use std::collections::{BTreeMap, BTreeSet};

use crate::AppState;
use crate::data_model::{EventType, IndexedEvent, StoreError, Timestamped};

#[derive(Clone, Debug)]
pub struct EventStreamStore<Device: Ord, E: Ord> {
    per_device: BTreeMap<Device, BTreeSet<E>>,
}

impl<Device: Ord, E: Ord> Default for EventStreamStore<Device, E> {
    fn default() -> Self {
        Self {
            per_device: BTreeMap::new(),
        }
    }
}

impl<Device: Ord, E: Ord> EventStreamStore<Device, E> {
    /// Insert without checking index contiguity. Test helper and internal
    /// building block; real ingestion goes through `add_device_events`.
    pub fn add_event_unchecked(&mut self, device: impl Into<Device>, event: E) {
        self.per_device.entry(device.into()).or_default().insert(event);
    }

    /// All events across all devices, merged in sort order.
    pub fn iter(&self) -> impl Iterator<Item = &E> + '_ {
        let mut merged: Vec<&E> = self.per_device.values().flatten().collect();
        merged.sort();
        merged.into_iter()
    }

    pub fn num_events(&self) -> usize {
        self.per_device.values().map(BTreeSet::len).sum()
    }

    pub fn len_device(&self, device: &Device) -> usize {
        self.per_device.get(device).map_or(0, BTreeSet::len)
    }

    pub fn num_events_per_device(&self) -> BTreeMap<&Device, usize> {
        self.per_device
            .iter()
            .map(|(device, events)| (device, events.len()))
            .collect()
    }
}

impl<Device: Ord, E: Ord + IndexedEvent> EventStreamStore<Device, E> {
    /// Drop the prefix of `events` we already have, and verify what remains
    /// starts exactly at this device's next index with no gaps. Re-syncing
    /// an overlapping batch is normal; skipping ahead means data loss.
    pub fn valid_to_add_events(
        &self,
        device: &Device,
        events: Vec<E>,
    ) -> Result<Vec<E>, StoreError> {
        let mut next = self.len_device(device);
        let mut fresh = Vec::new();
        for event in events {
            let index = event.within_device_events_index();
            if index < next {
                continue;
            }
            if index != next {
                return Err(StoreError::NonContiguous {
                    expected: next,
                    got: index,
                });
            }
            next += 1;
            fresh.push(event);
        }
        Ok(fresh)
    }

    /// Validated insert. Returns how many events were actually new.
    pub fn add_device_events(&mut self, device: Device, events: Vec<E>) -> Result<usize, StoreError>
    where
        Device: Clone,
    {
        let fresh = self.valid_to_add_events(&device, events)?;
        let added = fresh.len();
        for event in fresh {
            self.add_event_unchecked(device.clone(), event);
        }
        Ok(added)
    }

    /// Events a remote holding `remote_counts` events per device has not
    /// seen yet. This is the upload half of a sync.
    pub fn events_missing_from<'a>(
        &'a self,
        remote_counts: &'a BTreeMap<Device, usize>,
    ) -> impl Iterator<Item = (&'a Device, &'a E)> + 'a {
        self.per_device.iter().flat_map(move |(device, events)| {
            let known = remote_counts.get(device).copied().unwrap_or(0);
            events
                .iter()
                .filter(move |event| event.within_device_events_index() >= known)
                .map(move |event| (device, event))
        })
    }
}

impl<Device: Ord, E: crate::Event> EventStreamStore<Device, Timestamped<EventType<E>>> {
    /// Fold the merged stream into an application state, starting from
    /// `initial`. Meta events are the engine's own and are skipped.
    pub fn state<S: AppState<Event = E>>(&self, initial: S) -> S {
        self.iter().fold(initial, |state, timestamped| {
            match timestamped.event.user() {
                Some(user_event) => state.apply_event(&Timestamped {
                    timestamp: timestamped.timestamp,
                    within_device_events_index: timestamped.within_device_events_index,
                    event: user_event.clone(),
                }),
                None => state,
            }
        })
    }
}
