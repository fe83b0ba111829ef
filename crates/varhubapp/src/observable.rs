//! Explicit observer plumbing.
//!
//! Everything in the core is single-threaded and synchronous: a mutation fully
//! applies, then subscribers are called in registration order. Callbacks receive the
//! event by reference and cannot reach back into the emitter, so re-entrant mutation
//! from inside a notification is impossible by construction.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A callback registry for events of type `E`.
pub struct Publisher<E> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Box<dyn FnMut(&E)>)>,
}

impl<E> Default for Publisher<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Publisher<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl<E> Publisher<E> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(event);
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

/// A value holder that notifies on effective change.
#[derive(Debug)]
pub struct ObservableValue<T> {
    value: T,
    publisher: Publisher<T>,
}

impl<T: PartialEq> ObservableValue<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            publisher: Publisher::new(),
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    /// Stores `value` and notifies if it differs from the current one.
    /// Returns whether a change happened.
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.publisher.emit(&self.value);
        true
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> SubscriptionId {
        self.publisher.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }
}
