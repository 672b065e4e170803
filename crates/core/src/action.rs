//! Action types for the deterministic state machine.

use crate::{message::OutboundMessage, Event, TimerId};
use std::time::Duration;
use tokoin_types::Block;

/// Actions the state machine wants to perform.
///
/// Actions are **commands** - they describe something to do.
/// The runner executes actions and may convert results back into events.
#[derive(Debug, Clone)]
pub enum Action {
    // ═══════════════════════════════════════════════════════════════════════
    // Network
    // ═══════════════════════════════════════════════════════════════════════
    /// Send a message to a single peer.
    ///
    /// Best effort: one connection per message, no retry. A dial failure
    /// comes back as `Event::PeerUnreachable`.
    Send { to: String, message: OutboundMessage },

    /// Send a message to every validator, this node included.
    BroadcastToValidators { message: OutboundMessage },

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// Set a timer to fire after a duration.
    ///
    /// There is no cancellation; stale timers are discarded when they fire.
    SetTimer { id: TimerId, duration: Duration },

    // ═══════════════════════════════════════════════════════════════════════
    // Internal (fed back as events with Internal priority)
    // ═══════════════════════════════════════════════════════════════════════
    /// Enqueue an internal event for immediate processing.
    ///
    /// Internal events are processed before any further external input.
    EnqueueInternal { event: Event },

    // ═══════════════════════════════════════════════════════════════════════
    // External Notifications
    // ═══════════════════════════════════════════════════════════════════════
    /// Emit a committed block for external observers.
    EmitCommittedBlock { block: Block },
}

impl Action {
    /// Get a human-readable name for this action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Send { .. } => "Send",
            Action::BroadcastToValidators { .. } => "BroadcastToValidators",
            Action::SetTimer { .. } => "SetTimer",
            Action::EnqueueInternal { .. } => "EnqueueInternal",
            Action::EmitCommittedBlock { .. } => "EmitCommittedBlock",
        }
    }
}
