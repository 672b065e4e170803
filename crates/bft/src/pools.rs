//! Proposal and vote accounting.
//!
//! Pure counters, independent of the state machine. Every counter is
//! monotonic within a height and the whole set is cleared once when the
//! height advances. Senders are not part of any key, so a duplicated
//! message counts twice.

use std::collections::{HashMap, HashSet};
use tokoin_types::{Hash, Precommit, Prevote, Proposal};

/// Full content of a proposal, sender excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProposalKey {
    pub height: u64,
    pub round: u64,
    pub block_hash: Hash,
    pub valid_round: Option<u64>,
}

/// A proposal's value without its valid round.
///
/// The lock-and-valid rule and the commit rule match proposals on value
/// alone, whatever valid round the proposer justified them with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueKey {
    pub height: u64,
    pub round: u64,
    pub block_hash: Hash,
}

/// Content of a prevote or precommit; `value` is `None` for nil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoteKey {
    pub height: u64,
    pub round: u64,
    pub value: Option<Hash>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoundKey {
    pub height: u64,
    pub round: u64,
}

impl RoundKey {
    pub fn new(height: u64, round: u64) -> Self {
        Self { height, round }
    }
}

impl From<&Proposal> for ProposalKey {
    fn from(p: &Proposal) -> Self {
        Self {
            height: p.height,
            round: p.round,
            block_hash: p.block_hash,
            valid_round: p.valid_round,
        }
    }
}

impl From<&Proposal> for ValueKey {
    fn from(p: &Proposal) -> Self {
        Self {
            height: p.height,
            round: p.round,
            block_hash: p.block_hash,
        }
    }
}

impl From<&Prevote> for VoteKey {
    fn from(v: &Prevote) -> Self {
        Self {
            height: v.height,
            round: v.round,
            value: v.value,
        }
    }
}

impl From<&Precommit> for VoteKey {
    fn from(v: &Precommit) -> Self {
        Self {
            height: v.height,
            round: v.round,
            value: v.value,
        }
    }
}

/// Counters for proposals, prevotes, precommits and per-round traffic.
#[derive(Debug, Default)]
pub struct VotePools {
    /// Proposals seen, by full content. Presence only.
    proposals: HashSet<ProposalKey>,

    /// Proposals seen, by value. Presence only.
    proposal_values: HashSet<ValueKey>,

    prevotes: HashMap<VoteKey, u64>,
    precommits: HashMap<VoteKey, u64>,

    /// Prevotes of any value per (height, round).
    prevote_rounds: HashMap<RoundKey, u64>,

    /// Precommits of any value per (height, round).
    precommit_rounds: HashMap<RoundKey, u64>,

    /// Consensus messages of any kind per (height, round), for round skipping.
    messages: HashMap<RoundKey, u64>,
}

impl VotePools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a proposal under both its full content and its value.
    pub fn record_proposal(&mut self, proposal: &Proposal) {
        self.proposals.insert(ProposalKey::from(proposal));
        self.proposal_values.insert(ValueKey::from(proposal));
    }

    /// Whether a proposal with exactly this content was recorded.
    pub fn has_proposal(&self, key: &ProposalKey) -> bool {
        self.proposals.contains(key)
    }

    /// Whether a proposal for this value was recorded, whatever its valid round.
    pub fn has_proposal_value(&self, key: &ValueKey) -> bool {
        self.proposal_values.contains(key)
    }

    /// Count a prevote by content and return the new count.
    pub fn record_prevote(&mut self, prevote: &Prevote) -> u64 {
        increment(&mut self.prevotes, VoteKey::from(prevote))
    }

    /// Count a precommit by content and return the new count.
    pub fn record_precommit(&mut self, precommit: &Precommit) -> u64 {
        increment(&mut self.precommits, VoteKey::from(precommit))
    }

    /// Count a prevote of any value at (height, round).
    pub fn record_prevote_round(&mut self, key: RoundKey) -> u64 {
        increment(&mut self.prevote_rounds, key)
    }

    /// Count a precommit of any value at (height, round).
    pub fn record_precommit_round(&mut self, key: RoundKey) -> u64 {
        increment(&mut self.precommit_rounds, key)
    }

    /// Count a consensus message of any kind at (height, round).
    pub fn record_message_round(&mut self, key: RoundKey) -> u64 {
        increment(&mut self.messages, key)
    }

    pub fn prevote_count(&self, key: &VoteKey) -> u64 {
        self.prevotes.get(key).copied().unwrap_or(0)
    }

    pub fn precommit_count(&self, key: &VoteKey) -> u64 {
        self.precommits.get(key).copied().unwrap_or(0)
    }

    pub fn message_count(&self, key: &RoundKey) -> u64 {
        self.messages.get(key).copied().unwrap_or(0)
    }

    /// Whether nothing has been recorded since the last clear.
    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
            && self.proposal_values.is_empty()
            && self.prevotes.is_empty()
            && self.precommits.is_empty()
            && self.prevote_rounds.is_empty()
            && self.precommit_rounds.is_empty()
            && self.messages.is_empty()
    }

    /// Forget everything. Called once per height advance.
    pub fn clear(&mut self) {
        self.proposals.clear();
        self.proposal_values.clear();
        self.prevotes.clear();
        self.precommits.clear();
        self.prevote_rounds.clear();
        self.precommit_rounds.clear();
        self.messages.clear();
    }
}

fn increment<K: std::hash::Hash + Eq>(map: &mut HashMap<K, u64>, key: K) -> u64 {
    let count = map.entry(key).or_insert(0);
    *count += 1;
    *count
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokoin_types::test_utils::{test_address, test_hash};

    fn prevote(from: usize, round: u64, value: Option<Hash>) -> Prevote {
        Prevote {
            from: test_address(from),
            height: 3,
            round,
            value,
        }
    }

    #[test]
    fn test_prevote_counts_ignore_sender() {
        let mut pools = VotePools::new();
        let hash = test_hash("block");
        assert_eq!(pools.record_prevote(&prevote(0, 0, Some(hash))), 1);
        assert_eq!(pools.record_prevote(&prevote(1, 0, Some(hash))), 2);
        assert_eq!(pools.record_prevote(&prevote(2, 0, None)), 1);
        assert_eq!(pools.record_prevote(&prevote(3, 1, Some(hash))), 1);

        let key = VoteKey {
            height: 3,
            round: 0,
            value: Some(hash),
        };
        assert_eq!(pools.prevote_count(&key), 2);
    }

    #[test]
    fn test_duplicates_are_counted() {
        let mut pools = VotePools::new();
        let vote = prevote(1, 0, None);
        pools.record_prevote(&vote);
        assert_eq!(pools.record_prevote(&vote), 2);
    }

    #[test]
    fn test_proposal_value_key_ignores_valid_round() {
        let mut pools = VotePools::new();
        let proposal = Proposal {
            from: test_address(1),
            height: 3,
            round: 2,
            block_hash: test_hash("block"),
            valid_round: Some(0),
        };
        pools.record_proposal(&proposal);

        let mut exact = ProposalKey::from(&proposal);
        assert!(pools.has_proposal(&exact));
        exact.valid_round = None;
        assert!(!pools.has_proposal(&exact));

        assert!(pools.has_proposal_value(&ValueKey {
            height: 3,
            round: 2,
            block_hash: test_hash("block"),
        }));
    }

    #[test]
    fn test_round_tallies_are_separate() {
        let mut pools = VotePools::new();
        let key = RoundKey::new(3, 1);
        assert_eq!(pools.record_prevote_round(key), 1);
        assert_eq!(pools.record_prevote_round(key), 2);
        assert_eq!(pools.record_precommit_round(key), 1);
        assert_eq!(pools.record_message_round(key), 1);
        assert_eq!(pools.message_count(&key), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut pools = VotePools::new();
        pools.record_prevote(&prevote(0, 0, None));
        pools.record_message_round(RoundKey::new(3, 0));
        assert!(!pools.is_empty());

        pools.clear();
        assert!(pools.is_empty());
        assert_eq!(pools.record_prevote(&prevote(0, 0, None)), 1);
    }

    #[test]
    fn test_value_only_proposal_keeps_pools_non_empty() {
        let mut pools = VotePools::new();
        pools.proposal_values.insert(ValueKey {
            height: 3,
            round: 0,
            block_hash: test_hash("block"),
        });
        assert!(!pools.is_empty());

        pools.clear();
        assert!(pools.is_empty());
    }
}
