//! Pending match notifications awaiting dismissal.
//!
//! Bounded FIFO: the front entry is the one on screen. When full, the oldest
//! pending match is dropped, so a capacity of 1 behaves as a single slot that
//! the newest match overwrites.

use std::collections::VecDeque;

use crate::messages::MatchEvent;

#[derive(Debug, Clone)]
pub struct MatchMailbox {
    pending: VecDeque<MatchEvent>,
    capacity: usize,
}

impl MatchMailbox {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            pending: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, event: MatchEvent) {
        if self.pending.len() == self.capacity {
            if let Some(dropped) = self.pending.pop_front() {
                tracing::warn!(name = %dropped.name, "match mailbox full, dropping oldest match");
            }
        }
        self.pending.push_back(event);
    }

    /// The match currently displayed.
    pub fn current(&self) -> Option<&MatchEvent> {
        self.pending.front()
    }

    /// Clears the displayed match and reveals the next one, if any.
    pub fn dismiss(&mut self) -> Option<MatchEvent> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
