//! Deferred callbacks on the engine's millisecond clock.
//!
//! The match owner schedules an event for a deadline and gets back a handle
//! it can cancel. Due events come out in deadline order, ties in scheduling
//! order. A cancelled handle never fires.

use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug)]
pub struct Timers<E> {
    queue: BTreeMap<(u64, TimerId), E>,
    deadlines: HashMap<TimerId, u64>,
    next_id: u64,
}

impl<E> Timers<E> {
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, at: u64, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.insert((at, id), event);
        self.deadlines.insert(id, at);
        id
    }

    /// Returns false if the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(at) => self.queue.remove(&(at, id)).is_some(),
            None => false,
        }
    }

    /// Removes and returns the earliest event due at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<(u64, TimerId, E)> {
        let (&(at, id), _) = self.queue.first_key_value()?;
        if at > now {
            return None;
        }
        let event = self.queue.remove(&(at, id))?;
        self.deadlines.remove(&id);
        Some((at, id, event))
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl<E> Default for Timers<E> {
    fn default() -> Self {
        Self::new()
    }
}
