// src/supervisor/schedule.rs

use std::time::Duration;

use crate::config::SupervisorConfig;

/// Polling cadence of the monitor thread: quick early on for responsive
/// status text, coarser as the job ages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    gui_enabled: bool,
    fast: Duration,
    medium: Duration,
    slow: Duration,
    medium_after: Duration,
    slow_after: Duration,
    headless: Duration,
}

impl PollSchedule {
    pub fn from_config(cfg: &SupervisorConfig) -> Self {
        Self {
            gui_enabled: cfg.gui_enabled,
            fast: Duration::from_millis(cfg.fast_poll_ms),
            medium: Duration::from_millis(cfg.medium_poll_ms),
            slow: Duration::from_millis(cfg.slow_poll_ms),
            medium_after: Duration::from_secs(cfg.medium_after_secs),
            slow_after: Duration::from_secs(cfg.slow_after_secs),
            headless: Duration::from_millis(cfg.headless_poll_ms),
        }
    }

    /// Interval before the first poll.
    pub fn initial(&self) -> Duration {
        self.fast
    }

    /// Interval to use once the job has run for `elapsed`.
    pub fn interval_for(&self, elapsed: Duration) -> Duration {
        if !self.gui_enabled {
            return self.headless;
        }
        if elapsed > self.slow_after {
            self.slow
        } else if elapsed > self.medium_after {
            self.medium
        } else {
            self.fast
        }
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::from_config(&SupervisorConfig::default())
    }
}
