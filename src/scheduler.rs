// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Quantum Rift Simulation Suite - Tick Scheduler
//
// The host owns the clock and wakes the engine with `poll(now_ms)`. The timer
// fires at most once per wake and only re-arms after the tick it triggered
// has run, so ticks can never overlap or burst to catch up.

use serde::{Deserialize, Serialize};

use crate::types::TimeMode;

pub const NORMAL_INTERVAL_MS: f64 = 1000.0;
pub const FAST_INTERVAL_MS: f64 = 250.0;

/// Milliseconds between ticks, `None` while paused.
pub fn interval_ms(mode: TimeMode) -> Option<f64> {
    match mode {
        TimeMode::Pause => None,
        TimeMode::Normal => Some(NORMAL_INTERVAL_MS),
        TimeMode::Fast => Some(FAST_INTERVAL_MS),
    }
}

/// Ticks per second for display.
pub fn ticks_per_second(mode: TimeMode) -> f64 {
    interval_ms(mode).map(|ms| 1000.0 / ms).unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TickTimer {
    mode: TimeMode,
    next_due_ms: Option<f64>,
}

impl TickTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> TimeMode {
        self.mode
    }

    pub fn next_due_ms(&self) -> Option<f64> {
        self.next_due_ms
    }

    /// Switch modes. The first tick of the new mode is one full interval away.
    pub fn set_mode(&mut self, mode: TimeMode, now_ms: f64) {
        if mode == self.mode {
            return;
        }
        self.mode = mode;
        self.rearm(now_ms);
    }

    pub fn is_due(&self, now_ms: f64) -> bool {
        self.next_due_ms.map_or(false, |due| now_ms >= due)
    }

    /// Schedule the next wake one interval after `now_ms`.
    pub fn rearm(&mut self, now_ms: f64) {
        self.next_due_ms = interval_ms(self.mode).map(|interval| now_ms + interval);
    }

    /// Disarm the timer for the duration of a tick and report whether one is due.
    pub(crate) fn take_due(&mut self, now_ms: f64) -> bool {
        if self.is_due(now_ms) {
            self.next_due_ms = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_per_mode() {
        assert_eq!(ticks_per_second(TimeMode::Pause), 0.0);
        assert_eq!(ticks_per_second(TimeMode::Normal), 1.0);
        assert_eq!(ticks_per_second(TimeMode::Fast), 4.0);
    }

    #[test]
    fn paused_timer_never_fires() {
        let mut timer = TickTimer::new();
        assert!(!timer.take_due(1.0e12));
    }

    #[test]
    fn fires_once_per_wake_and_rearms_after() {
        let mut timer = TickTimer::new();
        timer.set_mode(TimeMode::Fast, 0.0);
        assert!(!timer.is_due(100.0));
        // Host slept for ten intervals: still just one tick.
        assert!(timer.take_due(2500.0));
        assert!(!timer.take_due(2500.0));
        timer.rearm(2500.0);
        assert_eq!(timer.next_due_ms(), Some(2750.0));
    }

    #[test]
    fn same_mode_does_not_reset_schedule() {
        let mut timer = TickTimer::new();
        timer.set_mode(TimeMode::Normal, 0.0);
        timer.set_mode(TimeMode::Normal, 900.0);
        assert!(timer.is_due(1000.0));
        timer.set_mode(TimeMode::Pause, 1000.0);
        assert_eq!(timer.next_due_ms(), None);
    }
}
