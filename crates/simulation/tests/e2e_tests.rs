//! End-to-end tests for four validators in the deterministic simulation.
//!
//! These run entirely synchronously with simulated time: `run_until()`
//! advances the simulation clock, and the same seed always produces the same
//! results.

use std::time::Duration;
use tokoin_bft::{BftConfig, VoteKey};
use tokoin_core::{Ledger, LedgerError};
use tokoin_ledger::MemoryLedger;
use tokoin_simulation::{NetworkConfig, SimulationRunner};
use tokoin_types::test_utils::{test_reward, test_transfer};
use tokoin_types::{Block, Hash, Step, Transaction, ValidatorSet};
use tracing_test::traced_test;

fn four_node_config() -> NetworkConfig {
    NetworkConfig {
        num_validators: 4,
        latency: Duration::from_millis(10),
        jitter_fraction: 0.1,
        ..Default::default()
    }
}

/// A ledger that refuses every proposed block but is otherwise ordinary.
struct RejectingLedger(MemoryLedger);

impl Ledger for RejectingLedger {
    fn best_height(&self) -> u64 {
        self.0.best_height()
    }

    fn tip(&self) -> &Block {
        self.0.tip()
    }

    fn append_block(&mut self, block: Block) -> Result<(), LedgerError> {
        self.0.append_block(block)
    }

    fn verify_block(&self, _block: &Block) -> bool {
        false
    }

    fn verify_transaction(&self, tx: &Transaction) -> bool {
        self.0.verify_transaction(tx)
    }

    fn find_block_by_hash(&self, hash: &Hash) -> Option<&Block> {
        self.0.find_block_by_hash(hash)
    }

    fn contains_transaction(&self, id: &Hash) -> bool {
        self.0.contains_transaction(id)
    }

    fn block_hashes(&self) -> Vec<Hash> {
        self.0.block_hashes()
    }

    fn rebuild_utxo_index(&mut self) {
        self.0.rebuild_utxo_index()
    }

    fn build_block(&self, transactions: Vec<Transaction>, timestamp: u64) -> Block {
        self.0.build_block(transactions, timestamp)
    }

    fn add_synced_block(&mut self, block: Block) -> bool {
        self.0.add_synced_block(block)
    }
}

/// Start every node and let the handshake with the seed settle.
fn started(mut runner: SimulationRunner) -> SimulationRunner {
    runner.start();
    runner.run_until(Duration::from_secs(1));
    runner
}

// ═══════════════════════════════════════════════════════════════════════════════
// Happy path
// ═══════════════════════════════════════════════════════════════════════════════

/// A transaction submitted to the seed is relayed, proposed by validator 0
/// and committed at height 1 on every node.
#[traced_test]
#[test]
fn test_transaction_committed_on_all_nodes() {
    let mut runner = started(SimulationRunner::new(four_node_config(), 42));

    let tx = test_reward("alice", 1);
    runner.submit_transaction(0, tx.clone());
    runner.run_until(Duration::from_secs(30));

    let expected = runner.node(0).unwrap().ledger().tip().clone();
    assert_eq!(expected.height, 1);
    assert!(expected.contains_transaction(&tx.id));

    for i in 0..4 {
        let node = runner.node(i).unwrap();
        assert_eq!(node.ledger().best_height(), 1, "node {} height", i);
        assert_eq!(node.ledger().tip(), &expected, "node {} tip", i);
        assert!(node.mempool().is_empty(), "node {} mempool", i);
        assert_eq!(node.bft().height(), 1, "node {} cursor", i);
        assert_eq!(runner.committed_blocks(i), &[expected.clone()][..]);
    }
    assert_eq!(runner.stats().blocks_committed, 4);
}

/// A second transaction spending the first one's output is committed at
/// height 2, proposed by validator 1.
#[test]
fn test_consecutive_heights() {
    let mut runner = started(SimulationRunner::new(four_node_config(), 7));

    let reward = test_reward("alice", 1);
    runner.submit_transaction(0, reward.clone());
    runner.run_until(Duration::from_secs(10));

    let transfer = test_transfer(&reward, 0, "alice", "bob", 4);
    runner.submit_transaction(0, transfer.clone());
    runner.run_until(Duration::from_secs(20));

    for i in 0..4 {
        let ledger = runner.node(i).unwrap().ledger();
        assert_eq!(ledger.best_height(), 2, "node {} height", i);
        assert!(ledger.tip().contains_transaction(&transfer.id));
        assert!(ledger.contains_transaction(&reward.id));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Liveness without safety violation
// ═══════════════════════════════════════════════════════════════════════════════

/// With two of four validators refusing every block, prevotes split 2-2.
/// No value reaches 2f+1, so the prevote timeout drives every node to a nil
/// precommit, and the nil precommit tally plus its timeout opens round 1.
#[traced_test]
#[test]
fn test_split_prevotes_advance_round_without_commit() {
    let ledgers: Vec<Box<dyn Ledger>> = vec![
        Box::new(MemoryLedger::new()),
        Box::new(MemoryLedger::new()),
        Box::new(RejectingLedger(MemoryLedger::new())),
        Box::new(RejectingLedger(MemoryLedger::new())),
    ];
    let mut runner = started(SimulationRunner::with_ledgers(
        four_node_config(),
        42,
        ValidatorSet::localhost(),
        BftConfig::default(),
        ledgers,
    ));

    runner.submit_transaction(0, test_reward("alice", 1));
    runner.run_until(Duration::from_secs(2));
    // Validator 0 proposes (0, 0).
    let proposed = runner.node(0).unwrap().bft().candidate().unwrap().hash;

    let vote = |value: Option<Hash>| VoteKey {
        height: 0,
        round: 0,
        value,
    };

    // Proposal at 1 s, prevote timeout at about 6 s, precommit timeout at about 11 s.
    runner.run_until(Duration::from_secs(8));
    for i in 0..4 {
        let bft = runner.node(i).unwrap().bft();
        assert_eq!(bft.round(), 0, "node {} left round 0 early", i);
        assert_eq!(bft.step(), Step::Precommit, "node {} step", i);
        assert_eq!(bft.pools().prevote_count(&vote(Some(proposed))), 2);
        assert_eq!(bft.pools().prevote_count(&vote(None)), 2);
        assert_eq!(bft.pools().precommit_count(&vote(None)), 4, "node {} nil precommits", i);
        assert_eq!(bft.pools().precommit_count(&vote(Some(proposed))), 0);
        assert_eq!(bft.locked_value(), None);
    }

    runner.run_until(Duration::from_secs(13));
    for i in 0..4 {
        let node = runner.node(i).unwrap();
        assert_eq!(node.bft().round(), 1, "node {} round", i);
        assert_eq!(node.bft().step(), Step::Prevote, "node {} step", i);
        assert_eq!(node.bft().locked_value(), None);
        assert_eq!(node.ledger().best_height(), 0, "node {} committed", i);
        assert!(runner.committed_blocks(i).is_empty());
        assert_eq!(node.mempool().len(), 1);
    }
    assert_eq!(runner.stats().blocks_committed, 0);
}

/// Three honest validators are a quorum: an isolated fourth does not block
/// progress.
#[test]
fn test_commit_with_one_validator_isolated() {
    let mut runner = SimulationRunner::new(four_node_config(), 3);
    runner.network_mut().isolate_node(3);
    let mut runner = started(runner);

    runner.submit_transaction(0, test_reward("alice", 1));
    runner.run_until(Duration::from_secs(30));

    for i in 0..3 {
        assert_eq!(runner.node(i).unwrap().ledger().best_height(), 1);
    }
    assert_eq!(runner.node(3).unwrap().ledger().best_height(), 0);
    assert!(runner.stats().messages_dropped_partition > 0);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Block sync
// ═══════════════════════════════════════════════════════════════════════════════

/// A validator that comes up after a commit learns the chain from its peers.
#[test]
fn test_late_node_catches_up_by_block_sync() {
    let mut runner = SimulationRunner::new(four_node_config(), 11);
    runner.network_mut().isolate_node(3);
    for node in 0..3 {
        runner.start_node(node);
    }
    runner.run_until(Duration::from_secs(1));

    runner.submit_transaction(0, test_reward("alice", 1));
    runner.run_until(Duration::from_secs(30));
    assert_eq!(runner.node(0).unwrap().ledger().best_height(), 1);

    runner.network_mut().heal_all();
    runner.start_node(3);
    runner.run_until(Duration::from_secs(40));

    let late = runner.node(3).unwrap();
    assert_eq!(late.ledger().best_height(), 1);
    assert_eq!(
        late.ledger().tip(),
        runner.node(0).unwrap().ledger().tip()
    );
    assert!(runner.committed_blocks(3).is_empty());
    assert!(!late.sync().is_syncing());
}

// ═══════════════════════════════════════════════════════════════════════════════
// Determinism
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_same_seed_same_run() {
    let run = |seed: u64| {
        let mut runner = started(SimulationRunner::new(four_node_config(), seed));
        runner.submit_transaction(0, test_reward("alice", 1));
        runner.run_until(Duration::from_secs(30));
        let tip = runner.node(2).unwrap().ledger().tip().clone();
        (runner.stats().clone(), tip)
    };

    assert_eq!(run(99), run(99));
}
