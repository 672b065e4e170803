//! Per-phase timeout bookkeeping.
//!
//! The scheduler only decides whether a timer should be started; the
//! runner owns the actual timers. Timers are never cancelled. A timer that
//! fires after the node has moved on is discarded by the state machine.

use tokoin_core::TimeoutPhase;

/// One armed slot per phase, remembering the (height, round) it was armed at.
#[derive(Debug, Default)]
pub struct TimeoutScheduler {
    armed: [Option<(u64, u64)>; 3],
}

impl TimeoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `phase` for (height, round).
    ///
    /// Returns `false` when a timer for the same phase, height and round is
    /// already in flight; the caller must not start another one.
    pub fn schedule(&mut self, phase: TimeoutPhase, height: u64, round: u64) -> bool {
        let slot = &mut self.armed[index(phase)];
        if *slot == Some((height, round)) {
            return false;
        }
        *slot = Some((height, round));
        true
    }

    /// Record that the timer armed at (height, round) fired.
    ///
    /// A slot re-armed for a later round since then stays armed.
    pub fn fired(&mut self, phase: TimeoutPhase, height: u64, round: u64) {
        let slot = &mut self.armed[index(phase)];
        if *slot == Some((height, round)) {
            *slot = None;
        }
    }

    pub fn is_armed(&self, phase: TimeoutPhase) -> bool {
        self.armed[index(phase)].is_some()
    }

    /// Disarm every phase.
    pub fn reset(&mut self) {
        self.armed = [None; 3];
    }
}

fn index(phase: TimeoutPhase) -> usize {
    match phase {
        TimeoutPhase::Propose => 0,
        TimeoutPhase::Prevote => 1,
        TimeoutPhase::Precommit => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_schedule_is_noop() {
        let mut scheduler = TimeoutScheduler::new();
        assert!(scheduler.schedule(TimeoutPhase::Prevote, 0, 0));
        assert!(!scheduler.schedule(TimeoutPhase::Prevote, 0, 0));
        assert!(scheduler.is_armed(TimeoutPhase::Prevote));
        assert!(!scheduler.is_armed(TimeoutPhase::Propose));
    }

    #[test]
    fn test_fired_disarms() {
        let mut scheduler = TimeoutScheduler::new();
        scheduler.schedule(TimeoutPhase::Propose, 1, 0);
        scheduler.fired(TimeoutPhase::Propose, 1, 0);
        assert!(!scheduler.is_armed(TimeoutPhase::Propose));
        assert!(scheduler.schedule(TimeoutPhase::Propose, 1, 0));
    }

    #[test]
    fn test_stale_fire_keeps_newer_arming() {
        let mut scheduler = TimeoutScheduler::new();
        scheduler.schedule(TimeoutPhase::Precommit, 1, 0);
        assert!(scheduler.schedule(TimeoutPhase::Precommit, 1, 1));
        scheduler.fired(TimeoutPhase::Precommit, 1, 0);
        assert!(scheduler.is_armed(TimeoutPhase::Precommit));
        assert!(!scheduler.schedule(TimeoutPhase::Precommit, 1, 1));
    }

    #[test]
    fn test_reset() {
        let mut scheduler = TimeoutScheduler::new();
        for phase in TimeoutPhase::ALL {
            scheduler.schedule(phase, 0, 0);
        }
        scheduler.reset();
        assert!(TimeoutPhase::ALL.iter().all(|p| !scheduler.is_armed(*p)));
    }
}
