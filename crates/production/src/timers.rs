//! Timer management for production runner.
//!
//! Provides tokio-based timers for the deterministic state machine. Every
//! consensus timeout is keyed by phase, height and round, so a timer is
//! never replaced; the state machine discards the ones that fire late.

use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokoin_core::{Event, TimerId};
use tracing::{debug, trace};

/// Manages timers for the production runner.
///
/// Each timer is a tokio task that sleeps for the specified duration and then
/// sends `Event::Timeout` to the event channel.
pub struct TimerManager {
    /// Active timers (id -> task handle).
    timers: HashMap<TimerId, JoinHandle<()>>,
    /// Event sender for timer fires.
    event_tx: mpsc::Sender<Event>,
}

impl TimerManager {
    /// Create a new timer manager.
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self {
            timers: HashMap::new(),
            event_tx,
        }
    }

    /// Set a timer that will fire after the given duration.
    ///
    /// Setting an id that is still pending leaves the pending timer alone.
    pub fn set_timer(&mut self, id: TimerId, duration: Duration) {
        self.timers.retain(|_, handle| !handle.is_finished());
        if self.timers.contains_key(&id) {
            trace!(?id, "Timer already pending");
            return;
        }

        let event_tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            trace!(?id, "Timer fired, sending event");
            let _ = event_tx.send(id.into_event()).await;
        });

        self.timers.insert(id, handle);
        debug!(
            phase = %id.phase,
            height = id.height,
            round = id.round,
            ?duration,
            "Timer set"
        );
    }

    /// Cancel all timers.
    ///
    /// Called during shutdown.
    pub fn cancel_all(&mut self) {
        for (id, handle) in self.timers.drain() {
            handle.abort();
            trace!(?id, "Timer cancelled (shutdown)");
        }
    }

    /// Get the number of timers that have not fired yet.
    pub fn active_count(&self) -> usize {
        self.timers
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }
}

impl Drop for TimerManager {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokoin_core::TimeoutPhase;

    #[tokio::test]
    async fn test_timer_fires() {
        let (event_tx, mut event_rx) = mpsc::channel(10);
        let mut manager = TimerManager::new(event_tx);

        manager.set_timer(
            TimerId::new(TimeoutPhase::Prevote, 3, 1),
            Duration::from_millis(10),
        );

        let event = tokio::time::timeout(Duration::from_millis(500), event_rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");

        assert!(matches!(
            event,
            Event::Timeout {
                phase: TimeoutPhase::Prevote,
                height: 3,
                round: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_same_id_is_not_rearmed() {
        let (event_tx, mut event_rx) = mpsc::channel(10);
        let mut manager = TimerManager::new(event_tx);
        let id = TimerId::new(TimeoutPhase::Propose, 0, 0);

        manager.set_timer(id, Duration::from_millis(10));
        manager.set_timer(id, Duration::from_millis(10));
        assert_eq!(manager.active_count(), 1);

        let _ = tokio::time::timeout(Duration::from_millis(500), event_rx.recv())
            .await
            .expect("timeout");
        let second = tokio::time::timeout(Duration::from_millis(50), event_rx.recv()).await;
        assert!(second.is_err(), "timer fired twice");
    }

    #[tokio::test]
    async fn test_cancel_all() {
        let (event_tx, mut event_rx) = mpsc::channel(10);
        let mut manager = TimerManager::new(event_tx);

        manager.set_timer(
            TimerId::new(TimeoutPhase::Propose, 0, 0),
            Duration::from_millis(50),
        );
        manager.set_timer(
            TimerId::new(TimeoutPhase::Precommit, 0, 0),
            Duration::from_millis(50),
        );
        assert_eq!(manager.active_count(), 2);

        manager.cancel_all();
        assert_eq!(manager.active_count(), 0);

        let result = tokio::time::timeout(Duration::from_millis(100), event_rx.recv()).await;
        assert!(result.is_err(), "cancelled timer fired");
    }
}
