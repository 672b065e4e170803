//! Proposal fetch request.

use crate::{Command, NetworkMessage};
use sbor::prelude::BasicSbor;
use tokoin_types::Hash;

/// Sent to a proposer after caching its block body; answered with a
/// [`ProposalGossip`](crate::ProposalGossip) for the proposer's current
/// height and round.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct GetProposalRequest {
    pub from: String,
    pub block_hash: Hash,
}

impl GetProposalRequest {
    pub fn new(from: impl Into<String>, block_hash: Hash) -> Self {
        Self {
            from: from.into(),
            block_hash,
        }
    }
}

impl NetworkMessage for GetProposalRequest {
    fn command() -> Command {
        Command::GetProposal
    }
}
