//! Recent message history
//!
//! `HistoryRing` keeps the last `capacity` published messages in publish
//! order and evicts the oldest first. It is never reordered or deduplicated.
//!
//! Concurrency note: the ring has no synchronization of its own; the broker
//! owns it behind the same lock as the subscriber registry.

use std::collections::VecDeque;

use crate::broker::message::Message;

/// Default number of messages replayed to a newly connected client.
pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

#[derive(Debug)]
pub struct HistoryRing {
    capacity: usize,
    entries: VecDeque<Message>,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a message, discarding the oldest entries beyond capacity.
    pub fn push(&mut self, msg: Message) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(msg);
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<Message> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryRing {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
