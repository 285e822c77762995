//! Cooperative timers for a run. Nothing here sleeps or spawns: callers pass the current
//! `Instant` and get back what became due.

use std::time::{Duration, Instant};

pub const TICK: Duration = Duration::from_secs(1);
pub const DEFAULT_AUTO_ADVANCE: Duration = Duration::from_millis(1500);

/// Identifies one question of one run. Timers armed for a different key are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuestionKey {
    pub run: u64,
    pub index: usize,
}

/// Once-per-second countdown for the current question.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    armed_for: Option<QuestionKey>,
    next_tick: Option<Instant>,
}

impl Countdown {
    pub fn arm(&mut self, key: QuestionKey, now: Instant) {
        self.armed_for = Some(key);
        self.next_tick = Some(now + TICK);
    }

    pub fn stop(&mut self) {
        self.armed_for = None;
        self.next_tick = None;
    }

    pub fn armed_for(&self) -> Option<QuestionKey> {
        self.armed_for
    }

    pub fn is_running(&self) -> bool {
        self.next_tick.is_some()
    }

    /// Returns true and schedules the following tick if a tick is due at `now`.
    ///
    /// Call in a loop to catch up after a long frame; each call consumes at most one tick.
    pub fn poll_tick(&mut self, now: Instant) -> bool {
        let Some(at) = self.next_tick else {
            return false;
        };
        if now < at {
            return false;
        }
        self.next_tick = Some(at + TICK);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    due: Instant,
    key: QuestionKey,
}

/// Deferred move from feedback to the next question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoAdvance {
    delay: Duration,
    pending: Option<Pending>,
}

impl Default for AutoAdvance {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_ADVANCE)
    }
}

impl AutoAdvance {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any earlier pending advance.
    pub fn schedule(&mut self, key: QuestionKey, now: Instant) {
        self.pending = Some(Pending {
            due: now + self.delay,
            key,
        });
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the pending advance if it is due, returning the question it was armed for.
    pub fn take_due(&mut self, now: Instant) -> Option<QuestionKey> {
        match self.pending {
            Some(p) if now >= p.due => {
                self.pending = None;
                Some(p.key)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: QuestionKey = QuestionKey { run: 1, index: 0 };

    #[test]
    fn countdown_ticks_once_per_second_and_catches_up() {
        let t0 = Instant::now();
        let mut c = Countdown::default();
        assert!(!c.poll_tick(t0 + Duration::from_secs(5)), "not armed yet");

        c.arm(KEY, t0);
        assert!(!c.poll_tick(t0 + Duration::from_millis(999)));
        assert!(c.poll_tick(t0 + Duration::from_secs(1)));
        assert!(!c.poll_tick(t0 + Duration::from_millis(1500)));

        let late = t0 + Duration::from_millis(3200);
        assert!(c.poll_tick(late));
        assert!(c.poll_tick(late));
        assert!(!c.poll_tick(late));
    }

    #[test]
    fn stopping_clears_the_schedule() {
        let t0 = Instant::now();
        let mut c = Countdown::default();
        c.arm(KEY, t0);
        c.stop();
        assert!(!c.is_running());
        assert_eq!(c.armed_for(), None);
        assert!(!c.poll_tick(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn auto_advance_fires_once_after_delay() {
        let t0 = Instant::now();
        let mut a = AutoAdvance::default();
        a.schedule(KEY, t0);
        assert_eq!(a.take_due(t0 + Duration::from_millis(1499)), None);
        assert_eq!(a.take_due(t0 + Duration::from_millis(1500)), Some(KEY));
        assert_eq!(a.take_due(t0 + Duration::from_secs(5)), None);
    }

    #[test]
    fn cancel_drops_pending_advance() {
        let t0 = Instant::now();
        let mut a = AutoAdvance::new(Duration::from_millis(200));
        a.schedule(KEY, t0);
        a.cancel();
        assert!(!a.is_pending());
        assert_eq!(a.take_due(t0 + Duration::from_secs(1)), None);
    }
}
