//! Cancellable periodic timer driven by a [`Clock`](crate::traits::Clock)
//!
//! The timer does not sleep by itself. The driver asks it how long until the
//! next deadline and calls [`PollTimer::fire`] once that time has come.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// A restartable fixed-interval timer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTimer {
    interval: Duration,
    next_due: Option<DateTime<Utc>>,
}

impl PollTimer {
    /// Create a stopped timer
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Timer period
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// (Re)start the countdown from `now`
    pub fn start(&mut self, now: DateTime<Utc>) {
        self.next_due = Some(now + self.period());
    }

    /// Cancel future ticks
    pub fn stop(&mut self) {
        self.next_due = None;
    }

    /// Whether the timer is running
    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Next deadline, if running
    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.next_due
    }

    /// Time left until the next tick, `None` if stopped
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.next_due
            .map(|due| (due - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// Consume a tick if one is due, scheduling the following one
    pub fn fire(&mut self, now: DateTime<Utc>) -> bool {
        match self.next_due {
            Some(due) if due <= now => {
                self.next_due = Some(now + self.period());
                true
            }
            _ => false,
        }
    }

    fn period(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.interval).unwrap_or_else(|_| chrono::Duration::weeks(52))
    }
}
