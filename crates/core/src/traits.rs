//! The state machine seam between protocol logic and runners.

use crate::{Action, Event};
use std::time::Duration;

/// Protocol logic driven one event at a time.
///
/// Implementations never block, never await, and never touch a socket or
/// the clock. Everything observable leaves through the returned actions, so
/// the simulation and production runners can drive the same node.
///
/// ```ignore
/// impl StateMachine for NodeStateMachine {
///     fn handle(&mut self, event: Event) -> Vec<Action> {
///         match event {
///             Event::PrevoteReceived { prevote } => {
///                 self.bft.on_prevote(prevote, self.ledger.as_ref())
///             }
///             Event::Timeout { phase, height, round } => {
///                 self.bft.on_timeout(phase, height, round)
///             }
///             // ...
///         }
///     }
/// }
/// ```
pub trait StateMachine {
    /// Apply `event` and return what the runner should do about it.
    ///
    /// Two machines in the same state given the same event return the same
    /// actions.
    fn handle(&mut self, event: Event) -> Vec<Action>;

    /// Tell the machine what time it is before the next `handle`.
    ///
    /// Simulated time in the simulation, wall-clock time since the UNIX
    /// epoch in production. Block timestamps are derived from it.
    fn set_time(&mut self, now: Duration);

    /// The time last given to [`set_time`](Self::set_time).
    fn now(&self) -> Duration;
}
