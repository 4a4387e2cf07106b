//! Per-level time budget
//!
//! Runs on the host's periodic timer, independent of the frame loop. Each
//! start hands out a fresh timer id; ticks from any other id are stale.

use crate::platform::{IntervalScheduler, TimerId};

/// Outcome of one countdown tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// Tick from a cancelled or replaced timer
    Stale,
    /// Timer is live but paused (a prompt is outstanding)
    Paused,
    /// Seconds left after this tick
    Running(u32),
    /// Budget exhausted; the timer has cancelled itself
    Expired,
}

pub struct LevelCountdown {
    scheduler: Box<dyn IntervalScheduler>,
    active: Option<TimerId>,
    remaining: u32,
    paused: bool,
}

impl LevelCountdown {
    pub fn new(scheduler: Box<dyn IntervalScheduler>) -> Self {
        Self {
            scheduler,
            active: None,
            remaining: 0,
            paused: false,
        }
    }

    /// Start counting down `seconds`, replacing any running countdown
    pub fn start(&mut self, seconds: u32) {
        self.cancel();
        self.remaining = seconds;
        self.paused = false;
        self.active = Some(self.scheduler.start_interval(1000));
    }

    /// Stop the countdown. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(id) = self.active.take() {
            self.scheduler.cancel_interval(id);
        }
        self.paused = false;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Handle one timer callback from the host
    pub fn tick(&mut self, id: TimerId) -> CountdownTick {
        if self.active != Some(id) {
            log::warn!("Ignoring stale countdown tick {:?}", id);
            return CountdownTick::Stale;
        }
        if self.paused {
            return CountdownTick::Paused;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.cancel();
            CountdownTick::Expired
        } else {
            CountdownTick::Running(self.remaining)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::ManualIntervals;

    #[test]
    fn test_counts_down_to_expiry() {
        let timers = ManualIntervals::default();
        let mut countdown = LevelCountdown::new(Box::new(timers.clone()));
        countdown.start(3);
        let id = timers.last_started().unwrap();

        assert_eq!(countdown.tick(id), CountdownTick::Running(2));
        assert_eq!(countdown.tick(id), CountdownTick::Running(1));
        assert_eq!(countdown.tick(id), CountdownTick::Expired);
        assert!(!countdown.is_running());
        assert!(timers.active().is_empty());
        // Late callback after expiry
        assert_eq!(countdown.tick(id), CountdownTick::Stale);
    }

    #[test]
    fn test_restart_makes_old_timer_stale() {
        let timers = ManualIntervals::default();
        let mut countdown = LevelCountdown::new(Box::new(timers.clone()));
        countdown.start(60);
        let old = timers.last_started().unwrap();
        countdown.start(50);
        let new = timers.last_started().unwrap();

        assert_eq!(countdown.tick(old), CountdownTick::Stale);
        assert_eq!(countdown.tick(new), CountdownTick::Running(49));
        assert_eq!(timers.active(), vec![new]);
    }

    #[test]
    fn test_paused_ticks_do_not_consume_budget() {
        let timers = ManualIntervals::default();
        let mut countdown = LevelCountdown::new(Box::new(timers.clone()));
        countdown.start(2);
        let id = timers.last_started().unwrap();

        countdown.set_paused(true);
        assert_eq!(countdown.tick(id), CountdownTick::Paused);
        assert_eq!(countdown.remaining(), 2);
        countdown.set_paused(false);
        assert_eq!(countdown.tick(id), CountdownTick::Running(1));
    }
}
