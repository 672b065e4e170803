//! Event types for the deterministic state machine.

use crate::TimeoutPhase;
use tokoin_messages::InventoryKind;
use tokoin_types::{Block, Hash, Precommit, Prevote, Proposal, Transaction};

/// Priority levels for event ordering within the same timestamp.
///
/// Events at the same simulation time are processed in priority order.
/// Lower values = higher priority (processed first).
///
/// Internal events (consequences of processing an event) are handled
/// before new external inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum EventPriority {
    /// Internal events: consequences of prior event processing.
    Internal = 0,

    /// Timer events: scheduled by the node itself.
    Timer = 1,

    /// Network events: external inputs from other nodes.
    Network = 2,
}

/// All possible events a node can receive.
///
/// Events are **passive data** - they describe something that happened.
/// The state machine processes events and returns actions.
#[derive(Debug, Clone)]
pub enum Event {
    // ═══════════════════════════════════════════════════════════════════════
    // Timers (priority: Timer)
    // ═══════════════════════════════════════════════════════════════════════
    /// A liveness timeout scheduled at `(height, round)` expired.
    Timeout {
        phase: TimeoutPhase,
        height: u64,
        round: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Network Messages - Peers and block sync (priority: Network)
    // ═══════════════════════════════════════════════════════════════════════
    AddrReceived { addresses: Vec<String> },

    VersionReceived {
        from: String,
        version: u32,
        best_height: u64,
    },

    GetBlocksReceived { from: String },

    InventoryReceived {
        from: String,
        kind: InventoryKind,
        items: Vec<Hash>,
    },

    GetDataReceived {
        from: String,
        kind: InventoryKind,
        id: Hash,
    },

    /// A block served during block sync.
    BlockReceived { from: String, block: Block },

    TransactionReceived {
        from: String,
        transaction: Transaction,
    },

    /// A peer could not be dialed. Reported by the transport.
    PeerUnreachable { address: String },

    // ═══════════════════════════════════════════════════════════════════════
    // Network Messages - Consensus (priority: Network)
    // ═══════════════════════════════════════════════════════════════════════
    /// Block body broadcast by a proposer.
    ProposeBlockReceived { from: String, block: Block },

    GetProposalReceived { from: String, block_hash: Hash },

    ProposalReceived { proposal: Proposal },

    PrevoteReceived { prevote: Prevote },

    PrecommitReceived { precommit: Precommit },

    // ═══════════════════════════════════════════════════════════════════════
    // Internal Events (priority: Internal)
    // ═══════════════════════════════════════════════════════════════════════
    /// The node process came up; triggers the handshake with the seed.
    NodeStarted,

    /// A block was committed to the ledger.
    BlockCommitted { block: Block },

    /// This node proposes at `(height, round)` but holds no value to propose.
    CandidateRequested { height: u64, round: u64 },
}

impl Event {
    /// Get the priority for this event type.
    pub fn priority(&self) -> EventPriority {
        match self {
            Event::NodeStarted | Event::BlockCommitted { .. } | Event::CandidateRequested { .. } => {
                EventPriority::Internal
            }

            Event::Timeout { .. } => EventPriority::Timer,

            Event::AddrReceived { .. }
            | Event::VersionReceived { .. }
            | Event::GetBlocksReceived { .. }
            | Event::InventoryReceived { .. }
            | Event::GetDataReceived { .. }
            | Event::BlockReceived { .. }
            | Event::TransactionReceived { .. }
            | Event::PeerUnreachable { .. }
            | Event::ProposeBlockReceived { .. }
            | Event::GetProposalReceived { .. }
            | Event::ProposalReceived { .. }
            | Event::PrevoteReceived { .. }
            | Event::PrecommitReceived { .. } => EventPriority::Network,
        }
    }

    /// Check if this is an internal event.
    pub fn is_internal(&self) -> bool {
        self.priority() == EventPriority::Internal
    }

    /// Get a human-readable name for this event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Event::Timeout { .. } => "Timeout",
            Event::AddrReceived { .. } => "AddrReceived",
            Event::VersionReceived { .. } => "VersionReceived",
            Event::GetBlocksReceived { .. } => "GetBlocksReceived",
            Event::InventoryReceived { .. } => "InventoryReceived",
            Event::GetDataReceived { .. } => "GetDataReceived",
            Event::BlockReceived { .. } => "BlockReceived",
            Event::TransactionReceived { .. } => "TransactionReceived",
            Event::PeerUnreachable { .. } => "PeerUnreachable",
            Event::ProposeBlockReceived { .. } => "ProposeBlockReceived",
            Event::GetProposalReceived { .. } => "GetProposalReceived",
            Event::ProposalReceived { .. } => "ProposalReceived",
            Event::PrevoteReceived { .. } => "PrevoteReceived",
            Event::PrecommitReceived { .. } => "PrecommitReceived",
            Event::NodeStarted => "NodeStarted",
            Event::BlockCommitted { .. } => "BlockCommitted",
            Event::CandidateRequested { .. } => "CandidateRequested",
        }
    }
}
