//! Outbound message types for network communication.

use crate::Event;
use tokoin_messages::{
    AddrGossip, BlockResponse, Command, GetBlocksRequest, GetDataRequest, GetProposalRequest,
    InventoryGossip, PrecommitGossip, PrevoteGossip, ProposalGossip, ProposeBlockGossip,
    TransactionGossip, VersionAnnouncement,
};

/// Outbound network messages.
///
/// These are the messages that a node can send to other nodes.
/// The runner handles the actual network I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    // ═══════════════════════════════════════════════════════════════════════
    // Peer and Sync Messages
    // ═══════════════════════════════════════════════════════════════════════
    Addr(AddrGossip),

    Version(VersionAnnouncement),

    GetBlocks(GetBlocksRequest),

    Inventory(InventoryGossip),

    GetData(GetDataRequest),

    Block(Box<BlockResponse>),

    // ═══════════════════════════════════════════════════════════════════════
    // Mempool Messages
    // ═══════════════════════════════════════════════════════════════════════
    Transaction(Box<TransactionGossip>),

    // ═══════════════════════════════════════════════════════════════════════
    // BFT Messages
    // ═══════════════════════════════════════════════════════════════════════
    /// Block body announced ahead of the proposal.
    ProposeBlock(Box<ProposeBlockGossip>),

    GetProposal(GetProposalRequest),

    Proposal(ProposalGossip),

    Prevote(PrevoteGossip),

    Precommit(PrecommitGossip),
}

impl OutboundMessage {
    /// Get a human-readable name for this message type.
    pub fn type_name(&self) -> &'static str {
        match self {
            OutboundMessage::Addr(_) => "Addr",
            OutboundMessage::Version(_) => "Version",
            OutboundMessage::GetBlocks(_) => "GetBlocks",
            OutboundMessage::Inventory(_) => "Inventory",
            OutboundMessage::GetData(_) => "GetData",
            OutboundMessage::Block(_) => "Block",
            OutboundMessage::Transaction(_) => "Transaction",
            OutboundMessage::ProposeBlock(_) => "ProposeBlock",
            OutboundMessage::GetProposal(_) => "GetProposal",
            OutboundMessage::Proposal(_) => "Proposal",
            OutboundMessage::Prevote(_) => "Prevote",
            OutboundMessage::Precommit(_) => "Precommit",
        }
    }

    /// The command tag this message travels under.
    pub fn command(&self) -> Command {
        match self {
            OutboundMessage::Addr(_) => Command::Addr,
            OutboundMessage::Version(_) => Command::Version,
            OutboundMessage::GetBlocks(_) => Command::GetBlocks,
            OutboundMessage::Inventory(_) => Command::Inv,
            OutboundMessage::GetData(_) => Command::GetData,
            OutboundMessage::Block(_) => Command::Block,
            OutboundMessage::Transaction(_) => Command::Tx,
            OutboundMessage::ProposeBlock(_) => Command::ProposeBlock,
            OutboundMessage::GetProposal(_) => Command::GetProposal,
            OutboundMessage::Proposal(_) => Command::Proposal,
            OutboundMessage::Prevote(_) => Command::Prevote,
            OutboundMessage::Precommit(_) => Command::Precommit,
        }
    }

    /// Check if this is a BFT consensus message.
    pub fn is_bft(&self) -> bool {
        matches!(
            self,
            OutboundMessage::ProposeBlock(_)
                | OutboundMessage::GetProposal(_)
                | OutboundMessage::Proposal(_)
                | OutboundMessage::Prevote(_)
                | OutboundMessage::Precommit(_)
        )
    }

    /// The event the receiving node handles for this message.
    pub fn into_event(self) -> Event {
        match self {
            OutboundMessage::Addr(m) => Event::AddrReceived {
                addresses: m.addresses,
            },
            OutboundMessage::Version(m) => Event::VersionReceived {
                from: m.from,
                version: m.version,
                best_height: m.best_height,
            },
            OutboundMessage::GetBlocks(m) => Event::GetBlocksReceived { from: m.from },
            OutboundMessage::Inventory(m) => Event::InventoryReceived {
                from: m.from,
                kind: m.kind,
                items: m.items,
            },
            OutboundMessage::GetData(m) => Event::GetDataReceived {
                from: m.from,
                kind: m.kind,
                id: m.id,
            },
            OutboundMessage::Block(m) => Event::BlockReceived {
                from: m.from,
                block: m.block,
            },
            OutboundMessage::Transaction(m) => Event::TransactionReceived {
                from: m.from,
                transaction: m.transaction,
            },
            OutboundMessage::ProposeBlock(m) => Event::ProposeBlockReceived {
                from: m.from,
                block: m.block,
            },
            OutboundMessage::GetProposal(m) => Event::GetProposalReceived {
                from: m.from,
                block_hash: m.block_hash,
            },
            OutboundMessage::Proposal(m) => Event::ProposalReceived {
                proposal: m.proposal,
            },
            OutboundMessage::Prevote(m) => Event::PrevoteReceived { prevote: m.prevote },
            OutboundMessage::Precommit(m) => Event::PrecommitReceived {
                precommit: m.precommit,
            },
        }
    }
}
