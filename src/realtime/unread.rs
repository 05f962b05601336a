use std::collections::HashMap;

use crate::models::{ChatMessage, UserId};

/// Per-peer unread message counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadCounts {
    counts: HashMap<UserId, u32>,
}

impl UnreadCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, peer: UserId) -> u32 {
        self.counts.get(&peer).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Counts `message` when `me` is its receiver. Returns whether it was
    /// counted.
    pub fn record_incoming(&mut self, message: &ChatMessage, me: UserId) -> bool {
        if message.receiver_id != me || message.sender_id == me {
            return false;
        }
        *self.counts.entry(message.sender_id).or_insert(0) += 1;
        true
    }

    pub fn set(&mut self, peer: UserId, count: u32) {
        if count == 0 {
            self.counts.remove(&peer);
        } else {
            self.counts.insert(peer, count);
        }
    }

    pub fn clear(&mut self, peer: UserId) {
        self.counts.remove(&peer);
    }

    /// Replaces every counter with the server's view.
    pub fn replace_all(&mut self, counts: HashMap<UserId, u32>) {
        self.counts = counts.into_iter().filter(|(_, c)| *c > 0).collect();
    }

    pub fn snapshot(&self) -> HashMap<UserId, u32> {
        self.counts.clone()
    }

    pub fn iter(&self) -> impl Iterator<Item = (UserId, u32)> + '_ {
        self.counts.iter().map(|(peer, count)| (*peer, *count))
    }
}
