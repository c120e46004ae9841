//! Single-threaded deadline queue.
//!
//! Entries are ordered by deadline, then by the order they were scheduled.
//! Cancelling removes the payload immediately; the heap entry is dropped
//! lazily when it reaches the top.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Handle of a scheduled entry.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    deadline: u64,
    id: TimerId,
}

#[derive(Debug)]
pub struct EventQueue<E> {
    heap: BinaryHeap<Reverse<Entry>>,
    pending: HashMap<TimerId, E>,
    next_id: u64,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: u64, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Entry { deadline, id }));
        self.pending.insert(id, event);
        id
    }

    /// Returns `true` if the entry was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id).is_some()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Removes and returns the earliest entry due at `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<(TimerId, E)> {
        while let Some(Reverse(top)) = self.heap.peek() {
            if top.deadline > now {
                return None;
            }
            let id = top.id;
            self.heap.pop();
            if let Some(event) = self.pending.remove(&id) {
                return Some((id, event));
            }
        }
        None
    }

    /// Deadline of the earliest live entry.
    pub fn next_deadline(&mut self) -> Option<u64> {
        while let Some(Reverse(top)) = self.heap.peek() {
            if self.pending.contains_key(&top.id) {
                return Some(top.deadline);
            }
            self.heap.pop();
        }
        None
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.pending.clear();
    }
}
