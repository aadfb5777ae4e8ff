//! # ChangeTracked
//! Wraps a store with a pending-notification flag so consumers (the UI)
//! know when derived state needs recomputing. The twist is the `modifier`:
//! when a listener itself writes to the store, it should not be re-notified
//! about its own change, so we track *who* to skip.

use std::ops::{Deref, DerefMut};

use crate::data_model::ListenerKey;

#[derive(Clone, Debug)]
pub enum PendingNotify {
    /// Nothing changed since the last drain.
    Idle,
    /// Changed; notify everyone except the listener that made the change.
    AllExcept(ListenerKey),
    /// Changed; notify everyone.
    All,
}

#[derive(Clone)]
pub struct ChangeTracked<Store> {
    store: Store,
    pub pending: PendingNotify,
    loaded_at_least_once: bool,
}

impl<Store: Default> Default for ChangeTracked<Store> {
    fn default() -> Self {
        Self {
            store: Default::default(),

            // Creating a stream is itself a change worth announcing.
            pending: PendingNotify::All,
            loaded_at_least_once: false,
        }
    }
}

/// Smart pointer that records a pending notification on mutable deref.
pub struct MarkOnWrite<'a, Store> {
    store: &'a mut Store,
    pending: &'a mut PendingNotify,
    modifier: Option<ListenerKey>,
}

impl<'a, Store> Deref for MarkOnWrite<'a, Store> {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        self.store
    }
}

impl<'a, Store> DerefMut for MarkOnWrite<'a, Store> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.mark_changed();
        self.store
    }
}

impl<'a, Store> MarkOnWrite<'a, Store> {
    fn mark_changed(&mut self) {
        use PendingNotify::*;
        *self.pending = match (&self.pending, self.modifier) {
            (Idle, Some(key)) => AllExcept(key),
            (AllExcept(key1), Some(key2)) if key1 == &key2 => AllExcept(*key1),
            (Idle, None) => All,
            (AllExcept(_), _) | (All, _) => All,
        };
    }
}

impl<Store> ChangeTracked<Store> {
    /// Returns true if the `loaded` marker was newly set.
    pub(crate) fn mark_loaded(&mut self, modifier: Option<ListenerKey>) -> bool {
        if !self.loaded_at_least_once {
            self.loaded_at_least_once = true;
            self.store_mut(modifier).mark_changed();
            true
        } else {
            false
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub(crate) fn store_mut(&mut self, modifier: Option<ListenerKey>) -> MarkOnWrite<'_, Store> {
        MarkOnWrite {
            store: &mut self.store,
            pending: &mut self.pending,
            modifier,
        }
    }

    pub fn loaded_at_least_once(&self) -> bool {
        self.loaded_at_least_once
    }
}
