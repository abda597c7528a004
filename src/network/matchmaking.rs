//! Matchmaking Queue
//!
//! Arrival-order pairing. The two oldest waiting players are matched.

use std::collections::VecDeque;

use crate::game::state::PlayerId;

/// FIFO waiting list.
#[derive(Debug, Clone, Default)]
pub struct Matchmaker {
    waiting: VecDeque<PlayerId>,
}

impl Matchmaker {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a player unless already waiting. Returns true if added.
    pub fn enqueue(&mut self, player_id: PlayerId) -> bool {
        if self.waiting.contains(&player_id) {
            return false;
        }
        self.waiting.push_back(player_id);
        true
    }

    /// Pop the two oldest players if at least two are waiting.
    pub fn next_pair(&mut self) -> Option<(PlayerId, PlayerId)> {
        if self.waiting.len() < 2 {
            return None;
        }
        let first = self.waiting.pop_front()?;
        let second = self.waiting.pop_front()?;
        Some((first, second))
    }

    /// Drop a player from the queue. Returns true if they were waiting.
    pub fn remove(&mut self, player_id: &PlayerId) -> bool {
        let before = self.waiting.len();
        self.waiting.retain(|id| id != player_id);
        self.waiting.len() != before
    }

    /// Is this player waiting?
    pub fn contains(&self, player_id: &PlayerId) -> bool {
        self.waiting.contains(player_id)
    }

    /// Waiting count.
    pub fn len(&self) -> usize {
        self.waiting.len()
    }

    /// True if nobody is waiting.
    pub fn is_empty(&self) -> bool {
        self.waiting.is_empty()
    }
}
