//! Tendermint consensus messages and the round step.

use crate::Hash;
use sbor::prelude::*;
use std::fmt;

/// Phase within a round.
///
/// Ordered: `Propose < Prevote < Precommit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BasicSbor)]
pub enum Step {
    Propose,
    Prevote,
    Precommit,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Propose => write!(f, "propose"),
            Step::Prevote => write!(f, "prevote"),
            Step::Precommit => write!(f, "precommit"),
        }
    }
}

/// Formal proposal of a block hash for a height and round.
///
/// `valid_round` is `None` for a fresh value, or the round at which the
/// proposer saw a prevote quorum for a re-proposed value.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Proposal {
    /// Address of the proposer.
    pub from: String,
    pub height: u64,
    pub round: u64,
    pub block_hash: Hash,
    pub valid_round: Option<u64>,
}

/// First-phase vote. `value` is `None` for a nil vote.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Prevote {
    /// Address of the voter.
    pub from: String,
    pub height: u64,
    pub round: u64,
    pub value: Option<Hash>,
}

/// Second-phase vote. `value` is `None` for a nil vote.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Precommit {
    /// Address of the voter.
    pub from: String,
    pub height: u64,
    pub round: u64,
    pub value: Option<Hash>,
}

impl Prevote {
    /// Whether this is a vote for nil.
    pub fn is_nil(&self) -> bool {
        self.value.is_none()
    }
}

impl Precommit {
    /// Whether this is a vote for nil.
    pub fn is_nil(&self) -> bool {
        self.value.is_none()
    }
}
