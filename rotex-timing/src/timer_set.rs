use std::collections::HashMap;
use std::hash::Hash;

use crate::{EventQueue, TimerId};

/// Named slots holding at most one pending queue entry each.
///
/// Arming a slot cancels whatever the slot held before, so a set never has
/// two live entries for the same slot.
#[derive(Debug)]
pub struct TimerSet<K> {
    slots: HashMap<K, TimerId>,
}

impl<K> Default for TimerSet<K> {
    fn default() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> TimerSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm<E>(
        &mut self,
        queue: &mut EventQueue<E>,
        slot: K,
        deadline: u64,
        event: E,
    ) -> TimerId {
        self.cancel(queue, slot);
        let id = queue.schedule(deadline, event);
        self.slots.insert(slot, id);
        id
    }

    /// Returns `true` if the slot had a pending entry.
    pub fn cancel<E>(&mut self, queue: &mut EventQueue<E>, slot: K) -> bool {
        match self.slots.remove(&slot) {
            Some(id) => queue.cancel(id),
            None => false,
        }
    }

    /// Cancels every slot. Safe to call with nothing pending.
    pub fn cancel_all<E>(&mut self, queue: &mut EventQueue<E>) -> usize {
        self.slots
            .drain()
            .filter(|(_, id)| queue.cancel(*id))
            .count()
    }

    /// Marks `slot` as fired. Returns `false` if `id` is not the entry the
    /// slot currently holds.
    pub fn fired(&mut self, slot: K, id: TimerId) -> bool {
        if self.slots.get(&slot) == Some(&id) {
            self.slots.remove(&slot);
            true
        } else {
            false
        }
    }

    pub fn is_armed(&self, slot: K) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn pending(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
