//! Ordered candidate queue; the head is the card shown on top.

use std::collections::{HashSet, VecDeque};

use crate::messages::Candidate;

#[derive(Debug, Clone, Default)]
pub struct CandidateQueue {
    items: VecDeque<Candidate>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the queue wholesale, keeping server order and the first
    /// occurrence of each id.
    pub fn replace(&mut self, candidates: Vec<Candidate>) {
        let mut seen = HashSet::new();
        self.items = candidates
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();
    }

    pub fn head(&self) -> Option<&Candidate> {
        self.items.front()
    }

    pub fn remove_head(&mut self) -> Option<Candidate> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Head first.
    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.items.iter()
    }
}

impl From<Vec<Candidate>> for CandidateQueue {
    fn from(candidates: Vec<Candidate>) -> Self {
        let mut queue = Self::new();
        queue.replace(candidates);
        queue
    }
}
