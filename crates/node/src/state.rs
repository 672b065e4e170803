//! Node state machine.

use crate::{BlockSync, PeerRegistry};
use std::collections::HashSet;
use std::time::Duration;
use tokoin_bft::{BftConfig, TendermintState};
use tokoin_core::{Action, Event, Ledger, OutboundMessage, StateMachine};
use tokoin_mempool::Mempool;
use tokoin_messages::{
    AddrGossip, BlockResponse, GetBlocksRequest, GetDataRequest, InventoryGossip, InventoryKind,
    TransactionGossip, VersionAnnouncement, PROTOCOL_VERSION,
};
use tokoin_types::{Block, Hash, OutPoint, Transaction, TxInput, ValidatorSet, BLOCK_REWARD};
use tracing::{debug, info, trace, warn};

/// Combined node state machine.
///
/// Composes Tendermint consensus, the mempool, the ledger, the peer
/// registry and block sync into a single state machine. Consensus events go
/// straight to [`TendermintState`]; gossip and sync events are handled here.
pub struct NodeStateMachine {
    /// This node's address.
    me: String,

    /// Owner of the reward in blocks this node proposes. Defaults to `me`.
    miner: Option<String>,

    bft: TendermintState,

    mempool: Mempool,

    ledger: Box<dyn Ledger>,

    peers: PeerRegistry,

    sync: BlockSync,

    /// Current time.
    now: Duration,
}

impl std::fmt::Debug for NodeStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeStateMachine")
            .field("me", &self.me)
            .field("height", &self.bft.height())
            .field("round", &self.bft.round())
            .field("step", &self.bft.step())
            .field("best_height", &self.ledger.best_height())
            .field("pending", &self.mempool.len())
            .field("now", &self.now)
            .finish()
    }
}

impl NodeStateMachine {
    /// Create a node deciding the height after the ledger's tip.
    ///
    /// # Arguments
    ///
    /// * `me` - This node's address, as listed in `validators`
    /// * `seed` - Address of the first known peer
    /// * `validators` - The fixed validator set
    /// * `bft_config` - Timeouts and the round bound
    /// * `ledger` - Block store; consensus commits into it
    pub fn new(
        me: impl Into<String>,
        seed: impl Into<String>,
        validators: ValidatorSet,
        bft_config: BftConfig,
        ledger: Box<dyn Ledger>,
    ) -> Self {
        let me = me.into();
        let height = ledger.best_height();
        Self {
            bft: TendermintState::new(me.clone(), validators, bft_config, height),
            me,
            miner: None,
            mempool: Mempool::new(),
            ledger,
            peers: PeerRegistry::new(seed),
            sync: BlockSync::new(),
            now: Duration::ZERO,
        }
    }

    /// Pay block rewards to `miner` instead of this node's address.
    pub fn with_miner(mut self, miner: impl Into<String>) -> Self {
        self.miner = Some(miner.into());
        self
    }

    pub fn address(&self) -> &str {
        &self.me
    }

    pub fn bft(&self) -> &TendermintState {
        &self.bft
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn ledger(&self) -> &dyn Ledger {
        self.ledger.as_ref()
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn sync(&self) -> &BlockSync {
        &self.sync
    }

    fn reward_owner(&self) -> String {
        self.miner.clone().unwrap_or_else(|| self.me.clone())
    }

    fn timestamp(&self) -> u64 {
        self.now.as_millis() as u64
    }

    fn send(&self, to: &str, message: OutboundMessage) -> Action {
        Action::Send {
            to: to.to_string(),
            message,
        }
    }

    /// Every known peer plus this node.
    fn addr(&self) -> OutboundMessage {
        let mut addresses: Vec<String> = self.peers.iter().map(String::from).collect();
        if !self.peers.contains(&self.me) {
            addresses.push(self.me.clone());
        }
        OutboundMessage::Addr(AddrGossip::new(addresses))
    }

    fn version(&self) -> OutboundMessage {
        OutboundMessage::Version(VersionAnnouncement::new(
            self.ledger.best_height(),
            self.me.clone(),
        ))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Peers and block sync
    // ═══════════════════════════════════════════════════════════════════════════

    fn on_node_started(&mut self) -> Vec<Action> {
        info!(
            address = %self.me,
            best_height = self.ledger.best_height(),
            seed = ?self.peers.seed(),
            "Node started"
        );
        match self.peers.seed() {
            Some(seed) if seed != self.me => vec![self.send(seed, self.version())],
            _ => vec![],
        }
    }

    fn on_addr(&mut self, addresses: Vec<String>) -> Vec<Action> {
        for address in addresses {
            if address != self.me {
                self.peers.add(address);
            }
        }
        let request = OutboundMessage::GetBlocks(GetBlocksRequest::new(self.me.clone()));
        self.peers
            .others(&[self.me.as_str()])
            .map(|peer| self.send(peer, request.clone()))
            .collect()
    }

    fn on_version(&mut self, from: String, version: u32, best_height: u64) -> Vec<Action> {
        if version != PROTOCOL_VERSION {
            warn!(from = %from, version, "Unsupported protocol version");
            return vec![];
        }

        let local = self.ledger.best_height();
        let mut actions = Vec::new();
        if local < best_height {
            debug!(from = %from, local, remote = best_height, "Peer is ahead, requesting blocks");
            actions.push(self.send(
                &from,
                OutboundMessage::GetBlocks(GetBlocksRequest::new(self.me.clone())),
            ));
        } else if local > best_height {
            actions.push(self.send(&from, self.version()));
        }

        // The seed introduces newcomers to the rest of the network.
        if from != self.me && self.peers.add(from.clone()) && self.peers.is_seed(&self.me) {
            actions.push(self.send(&from, self.addr()));
        }
        actions
    }

    fn on_get_blocks(&mut self, from: String) -> Vec<Action> {
        let hashes = self.ledger.block_hashes();
        vec![self.send(
            &from,
            OutboundMessage::Inventory(InventoryGossip::blocks(self.me.clone(), hashes)),
        )]
    }

    fn on_inventory(&mut self, from: String, kind: InventoryKind, items: Vec<Hash>) -> Vec<Action> {
        match kind {
            InventoryKind::Block => {
                let ledger = self.ledger.as_ref();
                let missing: Vec<Hash> = items
                    .into_iter()
                    .filter(|hash| ledger.find_block_by_hash(hash).is_none())
                    .collect();
                debug!(from = %from, missing = missing.len(), "Received block inventory");
                match self.sync.begin(missing) {
                    Some(hash) => vec![self.send(
                        &from,
                        OutboundMessage::GetData(GetDataRequest::block(self.me.clone(), hash)),
                    )],
                    None => vec![],
                }
            }
            InventoryKind::Tx => items
                .into_iter()
                .filter(|id| !self.mempool.contains(id))
                .map(|id| {
                    self.send(
                        &from,
                        OutboundMessage::GetData(GetDataRequest::transaction(self.me.clone(), id)),
                    )
                })
                .collect(),
        }
    }

    fn on_get_data(&mut self, from: String, kind: InventoryKind, id: Hash) -> Vec<Action> {
        let message = match kind {
            InventoryKind::Block => self.ledger.find_block_by_hash(&id).map(|block| {
                OutboundMessage::Block(Box::new(BlockResponse::new(
                    self.me.clone(),
                    block.clone(),
                )))
            }),
            InventoryKind::Tx => self.mempool.get(&id).map(|tx| {
                OutboundMessage::Transaction(Box::new(TransactionGossip::new(
                    self.me.clone(),
                    tx.clone(),
                )))
            }),
        };
        match message {
            Some(message) => vec![self.send(&from, message)],
            None => {
                trace!(from = %from, id = ?id, "Requested data not found");
                vec![]
            }
        }
    }

    fn on_block(&mut self, from: String, block: Block) -> Vec<Action> {
        let height = block.height;
        let hash = block.hash;
        if self.ledger.add_synced_block(block.clone()) {
            info!(from = %from, height, block_hash = ?hash, "Synced block");
            self.mempool.remove_committed(&block);
        }

        if let Some(next) = self.sync.next_block() {
            return vec![self.send(
                &from,
                OutboundMessage::GetData(GetDataRequest::block(self.me.clone(), next)),
            )];
        }

        self.ledger.rebuild_utxo_index();
        let best = self.ledger.best_height();
        if self.bft.advance_to_height(best) && !self.mempool.is_empty() {
            return self.propose_pending();
        }
        vec![]
    }

    fn on_peer_unreachable(&mut self, address: String) -> Vec<Action> {
        if self.peers.remove(&address) {
            warn!(peer = %address, "Peer unreachable, removed from registry");
        }
        vec![]
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // Transactions and candidates
    // ═══════════════════════════════════════════════════════════════════════════

    fn on_transaction(&mut self, from: String, transaction: Transaction) -> Vec<Action> {
        let id = transaction.id;
        if !self.mempool.insert(transaction) {
            return vec![];
        }
        info!(from = %from, tx_id = ?id, pending = self.mempool.len(), "Transaction received");

        let mut actions = Vec::new();
        if self.peers.is_seed(&self.me) {
            let inventory =
                OutboundMessage::Inventory(InventoryGossip::transactions(self.me.clone(), vec![id]));
            actions.extend(
                self.peers
                    .others(&[self.me.as_str(), from.as_str()])
                    .map(|peer| self.send(peer, inventory.clone())),
            );
        }

        self.bft.advance_to_height(self.ledger.best_height());
        actions.extend(self.propose_pending());
        actions
    }

    /// Refresh the candidate if this node proposes round 0, and start round 0
    /// unless a round is already under way.
    fn propose_pending(&mut self) -> Vec<Action> {
        if self.bft.is_proposer(self.bft.height(), 0) {
            let candidate = self.build_candidate();
            self.bft.set_candidate(candidate);
        }
        if self.bft.round_started() {
            return vec![];
        }
        self.bft.start_round(0)
    }

    fn on_block_committed(&mut self, block: Block) -> Vec<Action> {
        self.mempool.remove_committed(&block);
        if self.mempool.is_empty() {
            debug!(height = self.bft.height(), "Mempool drained");
            return vec![];
        }
        debug!(
            height = self.bft.height(),
            pending = self.mempool.len(),
            "Transactions still pending after commit"
        );
        self.propose_pending()
    }

    fn on_candidate_requested(&mut self, height: u64, round: u64) -> Vec<Action> {
        let candidate = self.build_candidate();
        self.bft.propose_candidate(height, round, candidate)
    }

    /// Assemble a block on the ledger tip from the mempool.
    ///
    /// Takes pending transactions in arrival order, skipping any that spend
    /// an output already taken by an earlier one. Transactions that no
    /// longer verify against the ledger are evicted. One freshly minted
    /// reward to the miner closes the block.
    fn build_candidate(&mut self) -> Block {
        let minted = Transaction::reward(
            self.reward_owner(),
            BLOCK_REWARD,
            self.ledger.best_height() + 1,
        );
        let mut transactions = Vec::new();
        let mut spent: HashSet<OutPoint> = HashSet::new();
        let mut evicted = Vec::new();

        for tx in self.mempool.all_pending() {
            if self.ledger.contains_transaction(&tx.id) || !self.ledger.verify_transaction(&tx) {
                evicted.push(tx.id);
                continue;
            }
            if tx.id == minted.id {
                continue;
            }
            let outpoints: Vec<OutPoint> = tx.inputs.iter().map(TxInput::outpoint).collect();
            if outpoints.iter().any(|outpoint| spent.contains(outpoint)) {
                trace!(tx_id = ?tx.id, "Skipping conflicting transaction");
                continue;
            }
            spent.extend(outpoints);
            transactions.push(tx);
        }

        for id in evicted {
            debug!(tx_id = ?id, "Evicting transaction that no longer verifies");
            self.mempool.remove(&id);
        }

        transactions.push(minted);
        self.ledger.build_block(transactions, self.timestamp())
    }
}

impl StateMachine for NodeStateMachine {
    fn handle(&mut self, event: Event) -> Vec<Action> {
        match event {
            // Timers
            Event::Timeout {
                phase,
                height,
                round,
            } => self.bft.on_timeout(phase, height, round),

            // Peers and block sync
            Event::AddrReceived { addresses } => self.on_addr(addresses),
            Event::VersionReceived {
                from,
                version,
                best_height,
            } => self.on_version(from, version, best_height),
            Event::GetBlocksReceived { from } => self.on_get_blocks(from),
            Event::InventoryReceived { from, kind, items } => self.on_inventory(from, kind, items),
            Event::GetDataReceived { from, kind, id } => self.on_get_data(from, kind, id),
            Event::BlockReceived { from, block } => self.on_block(from, block),
            Event::TransactionReceived { from, transaction } => {
                self.on_transaction(from, transaction)
            }
            Event::PeerUnreachable { address } => self.on_peer_unreachable(address),

            // Consensus
            Event::ProposeBlockReceived { from, block } => self.bft.on_propose_block(from, block),
            Event::GetProposalReceived { from, block_hash } => {
                self.bft.on_get_proposal(from, block_hash)
            }
            Event::ProposalReceived { proposal } => {
                self.bft.on_proposal(proposal, self.ledger.as_ref())
            }
            Event::PrevoteReceived { prevote } => self.bft.on_prevote(prevote, self.ledger.as_ref()),
            Event::PrecommitReceived { precommit } => {
                self.bft.on_precommit(precommit, self.ledger.as_mut())
            }

            // Internal
            Event::NodeStarted => self.on_node_started(),
            Event::BlockCommitted { block } => self.on_block_committed(block),
            Event::CandidateRequested { height, round } => {
                self.on_candidate_requested(height, round)
            }
        }
    }

    fn set_time(&mut self, now: Duration) {
        self.now = now;
    }

    fn now(&self) -> Duration {
        self.now
    }
}
