//! Scheduled Events
//!
//! Deferred work (respawns) kept in a min-heap keyed by wake time and
//! drained once per tick. Entries are never cancelled; an action whose
//! target has gone away simply does nothing when it fires.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::core::clock::Millis;
use crate::game::state::PlayerId;

/// Work to perform at a later simulated time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Bring a dead player back
    Respawn(PlayerId),
}

/// A queued action with its wake time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledEvent {
    /// Simulated time the action fires
    pub due_at: Millis,
    /// Insertion order, so equal wake times fire first-in first-out
    seq: u64,
    /// What to do
    pub action: ScheduledAction,
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.due_at
            .cmp(&other.due_at)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Wake-time ordered queue.
#[derive(Clone, Debug, Default)]
pub struct Schedule {
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
}

impl Schedule {
    /// Create an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action to fire at `due_at`.
    pub fn push(&mut self, due_at: Millis, action: ScheduledAction) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(ScheduledEvent { due_at, seq, action }));
    }

    /// Remove and return every action due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: Millis) -> Vec<ScheduledAction> {
        let mut due = Vec::new();
        while let Some(Reverse(next)) = self.heap.peek() {
            if next.due_at > now {
                break;
            }
            if let Some(Reverse(event)) = self.heap.pop() {
                due.push(event.action);
            }
        }
        due
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Check if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Count pending respawns for a player.
    pub fn pending_respawns(&self, id: &PlayerId) -> usize {
        self.heap
            .iter()
            .filter(|Reverse(e)| e.action == ScheduledAction::Respawn(*id))
            .count()
    }
}
