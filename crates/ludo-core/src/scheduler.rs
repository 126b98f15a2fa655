//! Deferred actions on a virtual clock.
//!
//! Dice animation, AI "thinking" and the pause before a skipped turn are
//! cosmetic delays. They are queued here with the ticket of the snapshot they
//! were scheduled against; the engine drops any task whose ticket no longer
//! matches the live state when it comes due.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity of one game snapshot: reset generation plus action version
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub generation: u64,
    pub version: u64,
}

/// Work the engine performs when a deferred action comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    /// Draw the die value for a roll in progress
    SettleDice,
    /// Pass a turn that has no legal move
    SkipTurn,
    /// Roll for a computer player
    AiRoll,
    /// Pick and play a move for a computer player
    AiMove,
}

/// A queued task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferred {
    /// Virtual time at which the task fires
    pub due: Duration,
    pub ticket: Ticket,
    pub task: Task,
    seq: u64,
}

/// Queue of deferred tasks ordered by due time, then insertion order
#[derive(Debug, Default)]
pub struct Scheduler {
    now: Duration,
    queue: Vec<Deferred>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Queue `task` to fire `delay` from now
    pub fn schedule(&mut self, delay: Duration, ticket: Ticket, task: Task) {
        let deferred = Deferred {
            due: self.now + delay,
            ticket,
            task,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        tracing::trace!(?task, ?delay, ?ticket, "deferred");
        self.queue.push(deferred);
    }

    /// Whether `task` is already queued for this ticket
    pub fn is_scheduled(&self, ticket: Ticket, task: Task) -> bool {
        self.queue.iter().any(|d| d.ticket == ticket && d.task == task)
    }

    /// Drop every task not issued for `current`; returns how many were dropped
    pub fn cancel_stale(&mut self, current: Ticket) -> usize {
        let before = self.queue.len();
        self.queue.retain(|d| d.ticket == current);
        before - self.queue.len()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    /// Time from now until the earliest task is due
    pub fn next_deadline(&self) -> Option<Duration> {
        self.earliest().map(|d| d.due.saturating_sub(self.now))
    }

    /// Remove the earliest task due at or before `limit`, moving the clock to
    /// its due time.
    pub fn pop_due(&mut self, limit: Duration) -> Option<Deferred> {
        let index = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, d)| d.due <= limit)
            .min_by_key(|(_, d)| (d.due, d.seq))
            .map(|(i, _)| i)?;
        let deferred = self.queue.remove(index);
        self.now = self.now.max(deferred.due);
        Some(deferred)
    }

    /// Move the clock forward without firing anything
    pub fn advance_clock(&mut self, to: Duration) {
        self.now = self.now.max(to);
    }

    fn earliest(&self) -> Option<&Deferred> {
        self.queue.iter().min_by_key(|d| (d.due, d.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(version: u64) -> Ticket {
        Ticket {
            generation: 0,
            version,
        }
    }

    #[test]
    fn test_tasks_fire_in_due_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::from_millis(500), ticket(1), Task::AiMove);
        scheduler.schedule(Duration::from_millis(100), ticket(1), Task::SettleDice);

        assert_eq!(scheduler.next_deadline(), Some(Duration::from_millis(100)));
        let first = scheduler.pop_due(Duration::from_secs(1)).unwrap();
        assert_eq!(first.task, Task::SettleDice);
        assert_eq!(scheduler.now(), Duration::from_millis(100));
        assert_eq!(scheduler.next_deadline(), Some(Duration::from_millis(400)));
    }

    #[test]
    fn test_equal_due_times_keep_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::ZERO, ticket(1), Task::SkipTurn);
        scheduler.schedule(Duration::ZERO, ticket(1), Task::AiRoll);
        assert_eq!(scheduler.pop_due(Duration::ZERO).unwrap().task, Task::SkipTurn);
        assert_eq!(scheduler.pop_due(Duration::ZERO).unwrap().task, Task::AiRoll);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_pop_due_respects_limit() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::from_millis(800), ticket(1), Task::AiRoll);
        assert!(scheduler.pop_due(Duration::from_millis(799)).is_none());
        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.pop_due(Duration::from_millis(800)).is_some());
    }

    #[test]
    fn test_cancel_stale_keeps_current_ticket_only() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::ZERO, ticket(1), Task::AiRoll);
        scheduler.schedule(Duration::ZERO, ticket(2), Task::AiMove);
        let stale_reset = Ticket {
            generation: 1,
            version: 2,
        };
        scheduler.schedule(Duration::ZERO, stale_reset, Task::SkipTurn);

        assert_eq!(scheduler.cancel_stale(ticket(2)), 2);
        assert!(scheduler.is_scheduled(ticket(2), Task::AiMove));
        assert!(!scheduler.is_scheduled(ticket(1), Task::AiRoll));
    }

    #[test]
    fn test_clock_only_moves_forward() {
        let mut scheduler = Scheduler::new();
        scheduler.advance_clock(Duration::from_secs(2));
        scheduler.advance_clock(Duration::from_secs(1));
        assert_eq!(scheduler.now(), Duration::from_secs(2));

        scheduler.schedule(Duration::from_millis(10), ticket(0), Task::SettleDice);
        assert_eq!(scheduler.next_deadline(), Some(Duration::from_millis(10)));
    }
}
