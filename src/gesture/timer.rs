// SPDX-License-Identifier: GPL-3.0-only

//! Cancellable timer queue for the gesture engine.
//!
//! All timing derives from event timestamps rather than wall clock, so the
//! queue is a plain sorted collection of deadlines. Every entry carries the
//! session generation it was scheduled in; the engine bumps its generation
//! when a touch session ends, turning any still-queued fires from the old
//! session into no-ops.

/// What a scheduled timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Re-emit the held repeatable key.
    Repeat,
    /// Open the popup for the held key.
    LongPress,
    /// Clear the key preview bubble.
    RemovePreview,
}

/// A scheduled timer entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTimer {
    /// Unique handle, monotonically assigned.
    pub id: u64,
    /// What to do on fire.
    pub kind: TimerKind,
    /// Absolute deadline in event-timestamp milliseconds.
    pub deadline_ms: u64,
    /// Key index the timer targets, if any.
    pub key: Option<usize>,
    /// Session generation at schedule time.
    pub generation: u64,
}

/// A queue of cancellable, deadline-ordered timers.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    timers: Vec<ScheduledTimer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a timer and returns its handle.
    pub fn schedule(
        &mut self,
        kind: TimerKind,
        deadline_ms: u64,
        key: Option<usize>,
        generation: u64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.timers.push(ScheduledTimer {
            id,
            kind,
            deadline_ms,
            key,
            generation,
        });
        id
    }

    /// Cancels every pending timer of the given kind.
    pub fn cancel_kind(&mut self, kind: TimerKind) {
        self.timers.retain(|t| t.kind != kind);
    }

    /// Cancels all pending timers.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Removes and returns the earliest timer due at or before `now_ms`.
    ///
    /// Call in a loop to drain everything due; ties pop in schedule order.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<ScheduledTimer> {
        let index = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline_ms <= now_ms)
            .min_by_key(|(_, t)| (t.deadline_ms, t.id))
            .map(|(i, _)| i)?;
        Some(self.timers.remove(index))
    }

    /// The earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.deadline_ms).min()
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    /// Timers pop in deadline order, not schedule order.
    #[test]
    fn test_pop_due_deadline_order() {
        let mut queue = TimerQueue::new();
        queue.schedule(TimerKind::Repeat, 500, Some(3), 0);
        queue.schedule(TimerKind::LongPress, 400, Some(3), 0);

        let first = queue.pop_due(1000).expect("first timer due");
        assert_eq!(first.kind, TimerKind::LongPress, "earliest deadline first");
        let second = queue.pop_due(1000).expect("second timer due");
        assert_eq!(second.kind, TimerKind::Repeat);
        assert!(queue.pop_due(1000).is_none(), "queue drained");
    }

    /// A timer whose deadline is in the future does not pop.
    #[test]
    fn test_pop_due_respects_deadline() {
        let mut queue = TimerQueue::new();
        queue.schedule(TimerKind::Repeat, 400, Some(0), 0);

        assert!(queue.pop_due(399).is_none(), "not yet due");
        assert!(queue.pop_due(400).is_some(), "due exactly at deadline");
    }

    /// cancel_kind removes only the matching kind.
    #[test]
    fn test_cancel_kind_is_selective() {
        let mut queue = TimerQueue::new();
        queue.schedule(TimerKind::Repeat, 400, Some(0), 0);
        queue.schedule(TimerKind::LongPress, 500, Some(0), 0);
        queue.schedule(TimerKind::RemovePreview, 100, None, 0);

        queue.cancel_kind(TimerKind::Repeat);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.next_deadline(), Some(100));
    }

    /// Handles are unique across schedule/cancel cycles.
    #[test]
    fn test_handles_unique() {
        let mut queue = TimerQueue::new();
        let a = queue.schedule(TimerKind::Repeat, 400, None, 0);
        queue.clear();
        let b = queue.schedule(TimerKind::Repeat, 400, None, 0);
        assert_ne!(a, b, "ids are never reused");
    }
}
