//! Stage Timers
//!
//! Interval timers driven by elapsed time instead of wall-clock
//! callbacks. A `TimerSet` is owned by the stage that scheduled it, so
//! leaving the stage (dropping it, or calling `clear`) cancels every
//! timer: no tick can fire against a stage that is no longer active.

use std::fmt::Debug;

#[derive(Debug, Clone)]
struct Timer<K> {
    key: K,
    interval_ms: u64,
    next_due_ms: u64,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired<K> {
    /// Which timer
    pub key: K,
    /// Stage-local time at which it was due
    pub due_ms: u64,
}

/// Set of named interval timers sharing one stage-local clock.
#[derive(Debug, Clone)]
pub struct TimerSet<K> {
    timers: Vec<Timer<K>>,
    now_ms: u64,
}

impl<K> Default for TimerSet<K> {
    fn default() -> Self {
        Self {
            timers: Vec::new(),
            now_ms: 0,
        }
    }
}

impl<K: Copy + Eq + Debug> TimerSet<K> {
    /// Create an empty set at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage-local time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `key` to fire every `interval_ms`, first at now + interval.
    ///
    /// Rescheduling an existing key replaces it (keeping its registration
    /// slot, which decides tie order).
    pub fn schedule(&mut self, key: K, interval_ms: u64) {
        let interval_ms = interval_ms.max(1);
        let next_due_ms = self.now_ms + interval_ms;

        if let Some(timer) = self.timers.iter_mut().find(|t| t.key == key) {
            timer.interval_ms = interval_ms;
            timer.next_due_ms = next_due_ms;
        } else {
            self.timers.push(Timer { key, interval_ms, next_due_ms });
        }
    }

    /// Cancel one timer. Returns whether it was scheduled.
    pub fn cancel(&mut self, key: K) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.key != key);
        self.timers.len() != before
    }

    /// Cancel every timer.
    pub fn clear(&mut self) {
        self.timers.clear();
    }

    /// Is `key` currently scheduled?
    pub fn is_scheduled(&self, key: K) -> bool {
        self.timers.iter().any(|t| t.key == key)
    }

    /// No timers scheduled?
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pop the earliest timer due at or before `deadline_ms`.
    ///
    /// Advances the clock to the timer's due time and reschedules it.
    /// Ties go to the timer registered first. Call repeatedly until it
    /// returns `None`, then `settle(deadline_ms)`.
    pub fn fire_next(&mut self, deadline_ms: u64) -> Option<Fired<K>> {
        let (index, _) = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.next_due_ms <= deadline_ms)
            .min_by_key(|(i, t)| (t.next_due_ms, *i))?;

        let timer = &mut self.timers[index];
        let fired = Fired { key: timer.key, due_ms: timer.next_due_ms };
        timer.next_due_ms += timer.interval_ms;
        self.now_ms = self.now_ms.max(fired.due_ms);
        Some(fired)
    }

    /// Move the clock forward to `deadline_ms` without firing anything.
    pub fn settle(&mut self, deadline_ms: u64) {
        self.now_ms = self.now_ms.max(deadline_ms);
    }

    /// Advance by `elapsed_ms` and return everything that fired, in order.
    pub fn advance(&mut self, elapsed_ms: u64) -> Vec<Fired<K>> {
        let deadline = self.now_ms + elapsed_ms;
        let mut fired = Vec::new();
        while let Some(next) = self.fire_next(deadline) {
            fired.push(next);
        }
        self.settle(deadline);
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Key {
        Fast,
        Slow,
    }

    #[test]
    fn test_fires_in_due_order() {
        let mut timers = TimerSet::new();
        timers.schedule(Key::Slow, 300);
        timers.schedule(Key::Fast, 100);

        let fired: Vec<_> = timers.advance(300).into_iter().map(|f| (f.key, f.due_ms)).collect();
        assert_eq!(
            fired,
            vec![(Key::Fast, 100), (Key::Fast, 200), (Key::Slow, 300), (Key::Fast, 300)]
        );
        assert_eq!(timers.now_ms(), 300);
    }

    #[test]
    fn test_ties_follow_registration_order() {
        let mut timers = TimerSet::new();
        timers.schedule(Key::Fast, 50);
        timers.schedule(Key::Slow, 50);

        let keys: Vec<_> = timers.advance(50).into_iter().map(|f| f.key).collect();
        assert_eq!(keys, vec![Key::Fast, Key::Slow]);
    }

    #[test]
    fn test_partial_intervals_accumulate() {
        let mut timers = TimerSet::new();
        timers.schedule(Key::Fast, 100);

        assert!(timers.advance(60).is_empty());
        assert_eq!(timers.advance(60).len(), 1);
        assert_eq!(timers.now_ms(), 120);
    }

    #[test]
    fn test_clear_cancels_everything() {
        let mut timers = TimerSet::new();
        timers.schedule(Key::Fast, 10);
        timers.schedule(Key::Slow, 20);

        timers.clear();
        assert!(timers.is_empty());
        assert!(timers.advance(1_000).is_empty());
    }

    #[test]
    fn test_cancel_single_timer() {
        let mut timers = TimerSet::new();
        timers.schedule(Key::Fast, 10);
        timers.schedule(Key::Slow, 20);

        assert!(timers.cancel(Key::Fast));
        assert!(!timers.cancel(Key::Fast));
        assert!(timers.is_scheduled(Key::Slow));
        assert!(timers.advance(20).iter().all(|f| f.key == Key::Slow));
    }

    #[test]
    fn test_reschedule_restarts_interval() {
        let mut timers = TimerSet::new();
        timers.schedule(Key::Fast, 100);
        timers.advance(90);

        timers.schedule(Key::Fast, 100);
        assert!(timers.advance(50).is_empty());
        assert_eq!(timers.advance(50).len(), 1);
    }
}
