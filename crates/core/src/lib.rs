//! Core types for Tokoin consensus.
//!
//! This crate provides the foundational types for the node architecture:
//!
//! - [`Event`]: All possible inputs to the state machine
//! - [`Action`]: All possible outputs from the state machine
//! - [`EventPriority`]: Ordering priority for events at the same timestamp
//! - [`StateMachine`]: The trait that all state machines implement
//! - [`Ledger`]: The block store the consensus engine commits into
//!
//! # Architecture
//!
//! ```text
//! Events → StateMachine::handle() → Actions
//! ```
//!
//! The state machine is synchronous, deterministic and performs no I/O.
//! All I/O is handled by the runner (simulation or production) which:
//! 1. Delivers events to the state machine
//! 2. Executes the returned actions
//! 3. Converts action results back into events

mod action;
mod event;
mod ledger;
mod message;
mod traits;

pub use action::Action;
pub use event::{Event, EventPriority};
pub use ledger::{Ledger, LedgerError};
pub use message::OutboundMessage;
pub use traits::StateMachine;

use std::fmt;

/// The three per-round liveness timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimeoutPhase {
    Propose,
    Prevote,
    Precommit,
}

impl TimeoutPhase {
    pub const ALL: [TimeoutPhase; 3] = [
        TimeoutPhase::Propose,
        TimeoutPhase::Prevote,
        TimeoutPhase::Precommit,
    ];
}

impl fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPhase::Propose => write!(f, "propose"),
            TimeoutPhase::Prevote => write!(f, "prevote"),
            TimeoutPhase::Precommit => write!(f, "precommit"),
        }
    }
}

/// Timer identification.
///
/// A timer remembers the height and round it was scheduled at; the state
/// machine uses them to discard the timeout once the node has moved on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    pub phase: TimeoutPhase,
    pub height: u64,
    pub round: u64,
}

impl TimerId {
    pub fn new(phase: TimeoutPhase, height: u64, round: u64) -> Self {
        Self {
            phase,
            height,
            round,
        }
    }

    /// The event delivered when this timer fires.
    pub fn into_event(self) -> Event {
        Event::Timeout {
            phase: self.phase,
            height: self.height,
            round: self.round,
        }
    }
}
