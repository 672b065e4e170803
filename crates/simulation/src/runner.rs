//! Deterministic simulation runner.
//!
//! Every node owns its ledger. Messages between nodes are scheduled on a
//! single global queue with seeded latency; timers are scheduled at
//! `now + duration`. Nothing here touches a socket or the wall clock.

use crate::event_queue::EventKey;
use crate::network::{NetworkConfig, SimulatedNetwork};
use crate::NodeIndex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokoin_bft::BftConfig;
use tokoin_core::{Action, Event, Ledger, OutboundMessage, StateMachine};
use tokoin_ledger::MemoryLedger;
use tokoin_node::NodeStateMachine;
use tokoin_types::{Block, Transaction, ValidatorSet};
use tracing::{debug, info, trace};

/// Sender address used for transactions injected by [`SimulationRunner::submit_transaction`].
pub const CLIENT_ADDRESS: &str = "client";

/// Deterministic simulation runner.
///
/// Processes events in deterministic order and executes actions.
/// Given the same seed, produces identical results every run.
pub struct SimulationRunner {
    /// All nodes in the simulation, indexed by NodeIndex.
    nodes: Vec<NodeStateMachine>,

    /// Node index by network address.
    addresses: HashMap<String, NodeIndex>,

    /// Global event queue, ordered deterministically.
    event_queue: BTreeMap<EventKey, Event>,

    /// Sequence counter for deterministic ordering.
    sequence: u64,

    /// Current simulation time.
    now: Duration,

    network: SimulatedNetwork,

    /// RNG for network conditions (seeded for determinism).
    rng: ChaCha8Rng,

    /// Blocks each node reported through `Action::EmitCommittedBlock`.
    committed: Vec<Vec<Block>>,

    stats: SimulationStats,
}

/// Statistics collected during simulation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimulationStats {
    /// Total events processed.
    pub events_processed: u64,
    /// Total actions generated.
    pub actions_generated: u64,
    /// Messages sent (successfully scheduled for delivery).
    pub messages_sent: u64,
    /// Messages dropped due to network partition.
    pub messages_dropped_partition: u64,
    /// Messages dropped due to packet loss.
    pub messages_dropped_loss: u64,
    /// Messages addressed to an unknown peer.
    pub messages_undeliverable: u64,
    pub timers_set: u64,
    pub blocks_committed: u64,
}

impl SimulationStats {
    /// Total messages dropped (partition + packet loss).
    pub fn messages_dropped(&self) -> u64 {
        self.messages_dropped_partition + self.messages_dropped_loss
    }
}

impl SimulationRunner {
    /// Four localhost validators, each on its own fresh [`MemoryLedger`].
    pub fn new(network_config: NetworkConfig, seed: u64) -> Self {
        let validators = ValidatorSet::new(
            (0..network_config.num_validators)
                .map(|i| format!("localhost:{}", 3000 + i))
                .collect(),
        );
        let ledgers = (0..network_config.num_validators)
            .map(|_| Box::new(MemoryLedger::new()) as Box<dyn Ledger>)
            .collect();
        Self::with_ledgers(network_config, seed, validators, BftConfig::default(), ledgers)
    }

    /// One node per validator, node `i` running on `ledgers[i]`.
    ///
    /// The first validator is every node's seed peer.
    ///
    /// # Panics
    ///
    /// Panics if the validator, ledger and configured node counts differ.
    pub fn with_ledgers(
        network_config: NetworkConfig,
        seed: u64,
        validators: ValidatorSet,
        bft_config: BftConfig,
        ledgers: Vec<Box<dyn Ledger>>,
    ) -> Self {
        assert_eq!(validators.len(), ledgers.len(), "one ledger per validator");
        assert_eq!(
            validators.len(),
            network_config.num_validators as usize,
            "network size must match the validator set"
        );

        let seed_peer = validators.addresses()[0].clone();
        let addresses = validators
            .addresses()
            .iter()
            .enumerate()
            .map(|(i, address)| (address.clone(), i as NodeIndex))
            .collect();
        let nodes: Vec<NodeStateMachine> = validators
            .addresses()
            .iter()
            .zip(ledgers)
            .map(|(address, ledger)| {
                NodeStateMachine::new(
                    address.clone(),
                    seed_peer.clone(),
                    validators.clone(),
                    bft_config.clone(),
                    ledger,
                )
            })
            .collect();

        info!(nodes = nodes.len(), seed = seed, "Simulation created");
        Self {
            committed: vec![Vec::new(); nodes.len()],
            nodes,
            addresses,
            event_queue: BTreeMap::new(),
            sequence: 0,
            now: Duration::ZERO,
            network: SimulatedNetwork::new(network_config),
            rng: ChaCha8Rng::seed_from_u64(seed),
            stats: SimulationStats::default(),
        }
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn node(&self, index: NodeIndex) -> Option<&NodeStateMachine> {
        self.nodes.get(index as usize)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn network(&self) -> &SimulatedNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut SimulatedNetwork {
        &mut self.network
    }

    /// Blocks committed by consensus on `node`, in commit order.
    ///
    /// Blocks obtained through block sync are not listed.
    pub fn committed_blocks(&self, node: NodeIndex) -> &[Block] {
        self.committed
            .get(node as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Bring every node up at the current time.
    pub fn start(&mut self) {
        for node in 0..self.nodes.len() as NodeIndex {
            self.start_node(node);
        }
    }

    /// Bring one node up: it introduces itself to the seed.
    pub fn start_node(&mut self, node: NodeIndex) {
        self.schedule_event(node, self.now, Event::NodeStarted);
    }

    /// Hand a client transaction to `node` at the current time.
    pub fn submit_transaction(&mut self, node: NodeIndex, transaction: Transaction) {
        debug!(node = node, tx_id = ?transaction.id, "Submitting transaction");
        self.schedule_event(
            node,
            self.now,
            Event::TransactionReceived {
                from: CLIENT_ADDRESS.to_string(),
                transaction,
            },
        );
    }

    /// Run simulation until no more events or time limit reached.
    pub fn run_until(&mut self, end_time: Duration) {
        while let Some(entry) = self.event_queue.first_entry() {
            if entry.key().time > end_time {
                break;
            }
            let (key, event) = entry.remove_entry();
            self.now = key.time;
            let node_index = key.node_index;

            trace!(
                time = ?self.now,
                node = node_index,
                event = event.type_name(),
                "Processing event"
            );
            self.stats.events_processed += 1;

            let node = &mut self.nodes[node_index as usize];
            node.set_time(self.now);
            let actions = node.handle(event);

            self.stats.actions_generated += actions.len() as u64;
            for action in actions {
                self.process_action(node_index, action);
            }
        }

        if self.now < end_time {
            self.now = end_time;
        }
        trace!(
            events_processed = self.stats.events_processed,
            remaining = self.event_queue.len(),
            "Simulation step complete"
        );
    }

    /// Process an action from a node.
    fn process_action(&mut self, from: NodeIndex, action: Action) {
        match action {
            Action::Send { to, message } => self.send(from, &to, message),

            Action::BroadcastToValidators { message } => {
                for to in self.network.all_nodes() {
                    self.deliver(from, to, message.clone());
                }
            }

            Action::SetTimer { id, duration } => {
                self.schedule_event(from, self.now + duration, id.into_event());
                self.stats.timers_set += 1;
            }

            Action::EnqueueInternal { event } => {
                self.schedule_event(from, self.now, event);
            }

            Action::EmitCommittedBlock { block } => {
                debug!(node = from, height = block.height, block_hash = ?block.hash, "Block committed");
                self.stats.blocks_committed += 1;
                self.committed[from as usize].push(block);
            }
        }
    }

    fn send(&mut self, from: NodeIndex, to: &str, message: OutboundMessage) {
        match self.addresses.get(to) {
            Some(&to) => self.deliver(from, to, message),
            None => {
                // No such peer: the dial fails, as it would over TCP.
                self.stats.messages_undeliverable += 1;
                self.schedule_event(
                    from,
                    self.now,
                    Event::PeerUnreachable {
                        address: to.to_string(),
                    },
                );
            }
        }
    }

    /// Deliver a message, accounting for partitions and packet loss.
    fn deliver(&mut self, from: NodeIndex, to: NodeIndex, message: OutboundMessage) {
        if from == to {
            self.schedule_event(to, self.now, message.into_event());
            return;
        }

        if self.network.is_partitioned(from, to) {
            self.stats.messages_dropped_partition += 1;
            trace!(from = from, to = to, "Message dropped due to partition");
            return;
        }

        if self.network.should_drop_packet(&mut self.rng) {
            self.stats.messages_dropped_loss += 1;
            trace!(from = from, to = to, "Message dropped due to packet loss");
            return;
        }

        let latency = self.network.sample_latency(&mut self.rng);
        self.schedule_event(to, self.now + latency, message.into_event());
        self.stats.messages_sent += 1;
    }

    fn schedule_event(&mut self, node: NodeIndex, time: Duration, event: Event) -> EventKey {
        self.sequence += 1;
        let key = EventKey::new(time, &event, node, self.sequence);
        self.event_queue.insert(key, event);
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokoin_messages::GetBlocksRequest;
    use tokoin_types::test_utils::test_reward;

    #[test]
    fn test_handshake_registers_with_seed() {
        let mut runner = SimulationRunner::new(NetworkConfig::default(), 1);
        runner.start();
        runner.run_until(Duration::from_secs(1));

        assert_eq!(runner.node_count(), 4);
        assert_eq!(runner.node(0).unwrap().peers().len(), 4);
        for i in 1..4 {
            let node = runner.node(i).unwrap();
            assert!(node.peers().contains("localhost:3000"), "node {} lost the seed", i);
        }
        assert_eq!(runner.stats().messages_dropped(), 0);
    }

    #[test]
    fn test_unknown_peer_reported_unreachable() {
        let mut runner = SimulationRunner::new(NetworkConfig::default(), 1);
        let message = OutboundMessage::GetBlocks(GetBlocksRequest::new("localhost:3000"));
        runner.send(0, "localhost:9999", message);
        runner.run_until(Duration::from_millis(1));
        assert_eq!(runner.stats().messages_undeliverable, 1);
        assert_eq!(runner.stats().events_processed, 1);
    }

    #[test]
    fn test_submitted_transaction_reaches_mempool() {
        let mut runner = SimulationRunner::new(NetworkConfig::default(), 1);
        let tx = test_reward("alice", 1);
        runner.submit_transaction(2, tx.clone());
        runner.run_until(Duration::ZERO);
        assert!(runner.node(2).unwrap().mempool().contains(&tx.id));
        assert_eq!(runner.now(), Duration::ZERO);
    }
}
