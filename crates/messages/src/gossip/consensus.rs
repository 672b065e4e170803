//! Consensus messages: block bodies, proposals and votes.

use crate::{Command, NetworkMessage};
use sbor::prelude::BasicSbor;
use tokoin_types::{Block, Precommit, Prevote, Proposal};

/// Block body broadcast by the proposer ahead of the formal proposal.
///
/// Receivers cache the body and answer with `getProposal`.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct ProposeBlockGossip {
    pub from: String,
    pub block: Block,
}

impl ProposeBlockGossip {
    pub fn new(from: impl Into<String>, block: Block) -> Self {
        Self {
            from: from.into(),
            block,
        }
    }
}

impl NetworkMessage for ProposeBlockGossip {
    fn command() -> Command {
        Command::ProposeBlock
    }
}

/// Formal proposal for a height and round.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct ProposalGossip {
    pub proposal: Proposal,
}

impl ProposalGossip {
    pub fn new(proposal: Proposal) -> Self {
        Self { proposal }
    }
}

impl NetworkMessage for ProposalGossip {
    fn command() -> Command {
        Command::Proposal
    }
}

/// Prevote broadcast to every validator.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct PrevoteGossip {
    pub prevote: Prevote,
}

impl PrevoteGossip {
    pub fn new(prevote: Prevote) -> Self {
        Self { prevote }
    }
}

impl NetworkMessage for PrevoteGossip {
    fn command() -> Command {
        Command::Prevote
    }
}

/// Precommit broadcast to every validator.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct PrecommitGossip {
    pub precommit: Precommit,
}

impl PrecommitGossip {
    pub fn new(precommit: Precommit) -> Self {
        Self { precommit }
    }
}

impl NetworkMessage for PrecommitGossip {
    fn command() -> Command {
        Command::Precommit
    }
}
