//! Tendermint consensus state machine.
//!
//! This module implements the height/round/step engine as a synchronous,
//! event-driven model. Handlers never fail: messages that do not match the
//! current height, round, step or proposer are dropped with a log line.

use crate::{BftConfig, BlockCache, ProposalKey, RoundKey, TimeoutScheduler, ValueKey, VotePools};
use tokoin_core::{Action, Event, Ledger, OutboundMessage, TimeoutPhase, TimerId};
use tokoin_messages::{
    GetProposalRequest, PrecommitGossip, PrevoteGossip, ProposalGossip, ProposeBlockGossip,
};
use tokoin_types::{Block, Hash, Precommit, Prevote, Proposal, Step, ValidatorSet};
use tracing::{debug, info, trace, warn};

/// Tendermint consensus state for one validator.
///
/// # State Machine Flow
///
/// 1. **Start Round** → Proposer broadcasts a block body, others arm the propose timeout
/// 2. **Block Body Received** → Cache it, request the formal proposal from the sender
/// 3. **Proposal Received** → Prevote the block (or nil) once per round
/// 4. **Prevote Quorum** → Lock the block and precommit it, or precommit nil
/// 5. **Precommit Quorum** → Verify and commit the block, advance the height
/// 6. **Timeouts** → Vote nil or move to the next round when progress stalls
pub struct TendermintState {
    // ═══════════════════════════════════════════════════════════════════════════
    // Identity
    // ═══════════════════════════════════════════════════════════════════════════
    /// This node's address.
    me: String,

    validators: ValidatorSet,

    config: BftConfig,

    // ═══════════════════════════════════════════════════════════════════════════
    // Cursor
    // ═══════════════════════════════════════════════════════════════════════════
    /// Height being decided. Equals the ledger height of the tip.
    height: u64,

    round: u64,

    step: Step,

    /// Whether this node has acted in any round at this height.
    round_started: bool,

    // ═══════════════════════════════════════════════════════════════════════════
    // Locks
    // ═══════════════════════════════════════════════════════════════════════════
    locked_value: Option<Hash>,
    locked_round: Option<u64>,

    /// Highest-round value seen with a prevote quorum.
    valid_value: Option<Hash>,
    valid_round: Option<u64>,

    // ═══════════════════════════════════════════════════════════════════════════
    // Per-height bookkeeping
    // ═══════════════════════════════════════════════════════════════════════════
    /// Block this node proposes when it holds no valid value.
    candidate: Option<Block>,

    pools: VotePools,

    block_cache: BlockCache,

    timeouts: TimeoutScheduler,
}

impl TendermintState {
    /// Create a state machine deciding `height`, before any round has started.
    pub fn new(
        me: impl Into<String>,
        validators: ValidatorSet,
        config: BftConfig,
        height: u64,
    ) -> Self {
        Self {
            me: me.into(),
            validators,
            config,
            height,
            round: 0,
            step: Step::Propose,
            round_started: false,
            locked_value: None,
            locked_round: None,
            valid_value: None,
            valid_round: None,
            candidate: None,
            pools: VotePools::new(),
            block_cache: BlockCache::new(),
            timeouts: TimeoutScheduler::new(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Accessors
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn address(&self) -> &str {
        &self.me
    }

    pub fn validators(&self) -> &ValidatorSet {
        &self.validators
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn round_started(&self) -> bool {
        self.round_started
    }

    pub fn locked_value(&self) -> Option<Hash> {
        self.locked_value
    }

    pub fn locked_round(&self) -> Option<u64> {
        self.locked_round
    }

    pub fn valid_value(&self) -> Option<Hash> {
        self.valid_value
    }

    pub fn valid_round(&self) -> Option<u64> {
        self.valid_round
    }

    pub fn candidate(&self) -> Option<&Block> {
        self.candidate.as_ref()
    }

    pub fn pools(&self) -> &VotePools {
        &self.pools
    }

    pub fn block_cache(&self) -> &BlockCache {
        &self.block_cache
    }

    pub fn timeouts(&self) -> &TimeoutScheduler {
        &self.timeouts
    }

    /// Check if this node proposes at (height, round).
    pub fn is_proposer(&self, height: u64, round: u64) -> bool {
        self.validators.is_proposer(&self.me, height, round)
    }

    fn max_rounds(&self) -> u64 {
        self.config
            .max_rounds
            .unwrap_or(self.validators.len() as u64)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Heights and rounds
    // ═══════════════════════════════════════════════════════════════════════════

    /// Set the block to propose when no valid value is held.
    pub fn set_candidate(&mut self, block: Block) {
        debug!(
            height = self.height,
            block_hash = ?block.hash,
            txs = block.transaction_count(),
            "Candidate block set"
        );
        self.candidate = Some(block);
    }

    /// Jump to a height reached outside consensus (block sync).
    ///
    /// Returns `false` and changes nothing unless `height` is above the
    /// current height.
    pub fn advance_to_height(&mut self, height: u64) -> bool {
        if height <= self.height {
            return false;
        }
        info!(from = self.height, to = height, "Advancing to synced height");
        self.enter_height(height);
        true
    }

    fn enter_height(&mut self, height: u64) {
        self.height = height;
        self.round = 0;
        self.step = Step::Propose;
        self.round_started = false;
        self.locked_value = None;
        self.locked_round = None;
        self.valid_value = None;
        self.valid_round = None;
        self.candidate = None;
        self.pools.clear();
        self.block_cache.clear();
        self.timeouts.reset();
    }

    /// Start `round` at the current height.
    ///
    /// The proposer broadcasts its value; everyone else arms the propose
    /// timeout. Rounds at or beyond the round bound are never started.
    pub fn start_round(&mut self, round: u64) -> Vec<Action> {
        if round >= self.max_rounds() {
            debug!(
                height = self.height,
                round = round,
                max_rounds = self.max_rounds(),
                "Round bound reached, not starting round"
            );
            return vec![];
        }

        self.round = round;
        self.set_step(Step::Propose);
        info!(height = self.height, round = round, "Starting round");

        if self.is_proposer(self.height, round) {
            self.propose()
        } else {
            self.schedule_timeout(TimeoutPhase::Propose)
        }
    }

    /// Broadcast the valid value, or the candidate, or ask for a candidate.
    fn propose(&self) -> Vec<Action> {
        let block = self
            .valid_value
            .and_then(|hash| self.block_cache.get(&hash).cloned())
            .or_else(|| self.candidate.clone());

        match block {
            Some(block) => {
                info!(
                    height = self.height,
                    round = self.round,
                    block_hash = ?block.hash,
                    valid_round = ?self.valid_round,
                    "Proposing block"
                );
                vec![Action::BroadcastToValidators {
                    message: OutboundMessage::ProposeBlock(Box::new(ProposeBlockGossip::new(
                        self.me.clone(),
                        block,
                    ))),
                }]
            }
            None => {
                debug!(
                    height = self.height,
                    round = self.round,
                    "No value to propose, requesting candidate"
                );
                vec![Action::EnqueueInternal {
                    event: Event::CandidateRequested {
                        height: self.height,
                        round: self.round,
                    },
                }]
            }
        }
    }

    /// Propose a freshly built candidate for (height, round).
    ///
    /// Ignored if the node has left that round or step since asking.
    pub fn propose_candidate(&mut self, height: u64, round: u64, block: Block) -> Vec<Action> {
        if height != self.height
            || round != self.round
            || self.step != Step::Propose
            || !self.is_proposer(height, round)
        {
            debug!(
                height = height,
                round = round,
                current_height = self.height,
                current_round = self.round,
                "Discarding stale candidate"
            );
            return vec![];
        }
        self.set_candidate(block);
        self.propose()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Proposals
    // ═══════════════════════════════════════════════════════════════════════════

    /// Handle a block body broadcast by a proposer.
    pub fn on_propose_block(&mut self, from: String, block: Block) -> Vec<Action> {
        if !block.has_valid_hash() {
            warn!(from = %from, block_hash = ?block.hash, "Block body does not match its hash");
            return vec![];
        }

        let block_hash = block.hash;
        debug!(from = %from, block_hash = ?block_hash, "Received block body");
        self.block_cache.insert(block);

        vec![Action::Send {
            to: from,
            message: OutboundMessage::GetProposal(GetProposalRequest::new(
                self.me.clone(),
                block_hash,
            )),
        }]
    }

    /// Answer a peer that cached our block body with the formal proposal.
    pub fn on_get_proposal(&mut self, from: String, block_hash: Hash) -> Vec<Action> {
        if !self.is_proposer(self.height, self.round) {
            debug!(
                from = %from,
                height = self.height,
                round = self.round,
                "Proposal requested while not proposer"
            );
            return vec![];
        }

        let proposal = Proposal {
            from: self.me.clone(),
            height: self.height,
            round: self.round,
            block_hash,
            valid_round: self.valid_round,
        };
        trace!(to = %from, block_hash = ?block_hash, "Sending proposal");
        vec![Action::Send {
            to: from,
            message: OutboundMessage::Proposal(ProposalGossip::new(proposal)),
        }]
    }

    /// Handle a formal proposal.
    pub fn on_proposal(&mut self, proposal: Proposal, ledger: &dyn Ledger) -> Vec<Action> {
        let expected = self.validators.proposer_for(proposal.height, proposal.round);
        if proposal.from != expected {
            debug!(
                from = %proposal.from,
                expected = %expected,
                height = proposal.height,
                round = proposal.round,
                "Proposal from wrong proposer"
            );
            return vec![];
        }
        if proposal.height != self.height {
            debug!(
                height = proposal.height,
                current_height = self.height,
                "Proposal for wrong height"
            );
            return vec![];
        }

        debug!(
            from = %proposal.from,
            height = proposal.height,
            round = proposal.round,
            block_hash = ?proposal.block_hash,
            valid_round = ?proposal.valid_round,
            "Received proposal"
        );

        self.pools.record_proposal(&proposal);
        let mut actions = self.record_round_message(proposal.height, proposal.round);

        if proposal.round == self.round
            && proposal.valid_round.is_none()
            && self.step == Step::Propose
        {
            let hash = proposal.block_hash;
            let unlocked = self.locked_round.is_none() || self.locked_value == Some(hash);
            let value = if self.verify_cached(&hash, ledger) && unlocked {
                Some(hash)
            } else {
                warn!(
                    height = self.height,
                    round = self.round,
                    block_hash = ?hash,
                    "Rejecting proposed block"
                );
                None
            };
            actions.extend(self.broadcast_prevote(value));
            self.set_step(Step::Prevote);
        }

        actions
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Votes
    // ═══════════════════════════════════════════════════════════════════════════

    /// Handle a prevote.
    pub fn on_prevote(&mut self, prevote: Prevote, ledger: &dyn Ledger) -> Vec<Action> {
        if prevote.height != self.height {
            debug!(
                from = %prevote.from,
                height = prevote.height,
                current_height = self.height,
                "Prevote for wrong height"
            );
            return vec![];
        }

        trace!(
            from = %prevote.from,
            round = prevote.round,
            value = ?prevote.value,
            "Received prevote"
        );

        let count = self.pools.record_prevote(&prevote);
        let mut actions = self.record_round_message(prevote.height, prevote.round);

        if self.validators.has_quorum(count) {
            match prevote.value {
                Some(hash) => actions.extend(self.on_prevote_quorum(prevote.round, hash, ledger)),
                None => {
                    if prevote.round == self.round && self.step == Step::Prevote {
                        info!(
                            height = self.height,
                            round = self.round,
                            "Prevote quorum for nil"
                        );
                        actions.extend(self.broadcast_precommit(None));
                        self.set_step(Step::Precommit);
                    }
                }
            }
        }

        let tally = self
            .pools
            .record_prevote_round(RoundKey::new(prevote.height, prevote.round));
        if self.validators.has_quorum(tally)
            && prevote.round == self.round
            && self.step == Step::Prevote
        {
            actions.extend(self.schedule_timeout(TimeoutPhase::Prevote));
        }

        actions
    }

    /// 2f+1 prevotes for `hash` at `vote_round`.
    fn on_prevote_quorum(&mut self, vote_round: u64, hash: Hash, ledger: &dyn Ledger) -> Vec<Action> {
        let mut actions = Vec::new();

        // Re-proposal of a value that had a quorum in an earlier round.
        let reproposal = ProposalKey {
            height: self.height,
            round: self.round,
            block_hash: hash,
            valid_round: Some(vote_round),
        };
        if self.step == Step::Propose
            && vote_round < self.round
            && self.pools.has_proposal(&reproposal)
        {
            let unlocked = self.locked_round.map_or(true, |locked| locked <= vote_round)
                || self.locked_value == Some(hash);
            let value = if self.verify_cached(&hash, ledger) && unlocked {
                Some(hash)
            } else {
                None
            };
            actions.extend(self.broadcast_prevote(value));
            self.set_step(Step::Prevote);
        }

        let proposed = ValueKey {
            height: self.height,
            round: self.round,
            block_hash: hash,
        };
        if vote_round == self.round
            && matches!(self.step, Step::Prevote | Step::Precommit)
            && self.pools.has_proposal_value(&proposed)
            && self.verify_cached(&hash, ledger)
        {
            if self.step == Step::Prevote {
                info!(
                    height = self.height,
                    round = self.round,
                    block_hash = ?hash,
                    "Locked on block"
                );
                self.locked_value = Some(hash);
                self.locked_round = Some(self.round);
                actions.extend(self.broadcast_precommit(Some(hash)));
                self.set_step(Step::Precommit);
            }
            self.valid_value = Some(hash);
            self.valid_round = Some(self.round);
        }

        actions
    }

    /// Handle a precommit. Commits into `ledger` on a quorum.
    pub fn on_precommit(&mut self, precommit: Precommit, ledger: &mut dyn Ledger) -> Vec<Action> {
        if precommit.height != self.height {
            debug!(
                from = %precommit.from,
                height = precommit.height,
                current_height = self.height,
                "Precommit for wrong height"
            );
            return vec![];
        }

        trace!(
            from = %precommit.from,
            round = precommit.round,
            value = ?precommit.value,
            "Received precommit"
        );

        if let Some(hash) = precommit.value {
            let count = self.pools.record_precommit(&precommit);
            let proposed = ValueKey {
                height: self.height,
                round: precommit.round,
                block_hash: hash,
            };
            if self.validators.has_quorum(count)
                && self.pools.has_proposal_value(&proposed)
                && ledger.best_height() <= self.height
            {
                if let Some(actions) = self.commit(hash, ledger) {
                    return actions;
                }
            }
        }

        let mut actions = self.record_round_message(precommit.height, precommit.round);

        let tally = self
            .pools
            .record_precommit_round(RoundKey::new(precommit.height, precommit.round));
        if self.validators.has_quorum(tally) && precommit.round == self.round {
            actions.extend(self.schedule_timeout(TimeoutPhase::Precommit));
        }

        actions
    }

    /// Verify and store the block, then move to the next height.
    ///
    /// Returns `None` and leaves the height unchanged if the block is
    /// unknown or fails verification.
    fn commit(&mut self, hash: Hash, ledger: &mut dyn Ledger) -> Option<Vec<Action>> {
        let Some(block) = self.block_cache.get(&hash).cloned() else {
            warn!(height = self.height, block_hash = ?hash, "Commit quorum for unknown block");
            return None;
        };
        if !ledger.verify_block(&block) {
            warn!(height = self.height, block_hash = ?hash, "Committed block failed verification");
            return None;
        }
        if let Err(e) = ledger.append_block(block.clone()) {
            warn!(height = self.height, error = %e, "Failed to append committed block");
            return None;
        }
        ledger.rebuild_utxo_index();

        info!(
            height = self.height,
            round = self.round,
            block_hash = ?hash,
            txs = block.transaction_count(),
            "Committed block"
        );

        self.enter_height(self.height + 1);

        Some(vec![
            Action::EmitCommittedBlock {
                block: block.clone(),
            },
            Action::EnqueueInternal {
                event: Event::BlockCommitted { block },
            },
        ])
    }

    /// Count a message toward round skipping and skip if f+1 are seen for a higher round.
    fn record_round_message(&mut self, height: u64, round: u64) -> Vec<Action> {
        let count = self.pools.record_message_round(RoundKey::new(height, round));
        if round > self.round && self.validators.has_round_skip(count) {
            info!(
                height = height,
                from_round = self.round,
                to_round = round,
                "Skipping to higher round"
            );
            return self.start_round(round);
        }
        vec![]
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Timeouts
    // ═══════════════════════════════════════════════════════════════════════════

    /// Handle a fired timer scheduled at (height, round).
    pub fn on_timeout(&mut self, phase: TimeoutPhase, height: u64, round: u64) -> Vec<Action> {
        self.timeouts.fired(phase, height, round);

        if height != self.height || round != self.round {
            trace!(
                phase = %phase,
                height = height,
                round = round,
                "Ignoring stale timeout"
            );
            return vec![];
        }

        match phase {
            TimeoutPhase::Propose if self.step == Step::Propose => {
                info!(height = height, round = round, "Propose timeout, prevoting nil");
                let actions = self.broadcast_prevote(None);
                self.set_step(Step::Prevote);
                actions
            }
            TimeoutPhase::Prevote if self.step == Step::Prevote => {
                info!(height = height, round = round, "Prevote timeout, precommitting nil");
                let actions = self.broadcast_precommit(None);
                self.set_step(Step::Precommit);
                actions
            }
            TimeoutPhase::Precommit if round + 1 >= self.max_rounds() => {
                // Rounds exhausted: the next transaction restarts the height at round 0.
                info!(height = height, round = round, "Precommit timeout in last round, height idle");
                self.round_started = false;
                self.timeouts.reset();
                vec![]
            }
            TimeoutPhase::Precommit => {
                info!(height = height, round = round, "Precommit timeout, moving to next round");
                self.start_round(round + 1)
            }
            _ => {
                trace!(phase = %phase, step = %self.step, "Timeout for a finished step");
                vec![]
            }
        }
    }

    fn schedule_timeout(&mut self, phase: TimeoutPhase) -> Vec<Action> {
        if !self.timeouts.schedule(phase, self.height, self.round) {
            return vec![];
        }
        let duration = match phase {
            TimeoutPhase::Propose => self.config.propose_timeout,
            TimeoutPhase::Prevote => self.config.prevote_timeout,
            TimeoutPhase::Precommit => self.config.precommit_timeout,
        };
        debug!(
            phase = %phase,
            height = self.height,
            round = self.round,
            ?duration,
            "Scheduling timeout"
        );
        vec![Action::SetTimer {
            id: TimerId::new(phase, self.height, self.round),
            duration,
        }]
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Helpers
    // ═══════════════════════════════════════════════════════════════════════════

    /// A block missing from the cache fails verification.
    fn verify_cached(&self, hash: &Hash, ledger: &dyn Ledger) -> bool {
        self.block_cache
            .get(hash)
            .is_some_and(|block| ledger.verify_block(block))
    }

    /// Any step taken in a round counts as having started it.
    fn set_step(&mut self, step: Step) {
        if self.step != step {
            debug!(height = self.height, round = self.round, step = %step, "Step changed");
        }
        self.step = step;
        self.round_started = true;
    }

    fn broadcast_prevote(&self, value: Option<Hash>) -> Vec<Action> {
        let prevote = Prevote {
            from: self.me.clone(),
            height: self.height,
            round: self.round,
            value,
        };
        vec![Action::BroadcastToValidators {
            message: OutboundMessage::Prevote(PrevoteGossip::new(prevote)),
        }]
    }

    fn broadcast_precommit(&self, value: Option<Hash>) -> Vec<Action> {
        let precommit = Precommit {
            from: self.me.clone(),
            height: self.height,
            round: self.round,
            value,
        };
        vec![Action::BroadcastToValidators {
            message: OutboundMessage::Precommit(PrecommitGossip::new(precommit)),
        }]
    }
}
