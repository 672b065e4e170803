//! In-memory chain.

use crate::UtxoIndex;
use std::collections::{HashMap, HashSet};
use tokoin_core::{Ledger, LedgerError};
use tokoin_types::{Block, Hash, OutPoint, Transaction};
use tracing::{debug, info, trace};

/// Append-only chain held in memory.
///
/// Starts with the shared genesis block. Blocks are only ever added on
/// top of the tip, either by a consensus commit or by block sync.
#[derive(Debug)]
pub struct MemoryLedger {
    blocks: Vec<Block>,
    by_hash: HashMap<Hash, usize>,
    /// Ids of every committed transaction.
    transactions: HashSet<Hash>,
    utxos: UtxoIndex,
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedger {
    /// A ledger holding only the genesis block.
    pub fn new() -> Self {
        let mut ledger = Self {
            blocks: Vec::new(),
            by_hash: HashMap::new(),
            transactions: HashSet::new(),
            utxos: UtxoIndex::new(),
        };
        ledger.push(Block::genesis());
        ledger.rebuild_utxo_index();
        ledger
    }

    pub fn utxos(&self) -> &UtxoIndex {
        &self.utxos
    }

    /// Block at `height`, if stored.
    pub fn block_at(&self, height: u64) -> Option<&Block> {
        self.blocks.get(height as usize)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    fn push(&mut self, block: Block) {
        self.by_hash.insert(block.hash, self.blocks.len());
        self.transactions
            .extend(block.transactions.iter().map(|tx| tx.id));
        self.blocks.push(block);
    }

    fn check_extends_tip(&self, block: &Block) -> Result<(), LedgerError> {
        if !block.has_valid_hash() {
            return Err(LedgerError::InvalidHash(block.hash));
        }
        let tip = self.tip();
        if block.height != tip.height + 1 || block.prev_hash != tip.hash {
            return Err(LedgerError::DoesNotExtendTip {
                hash: block.hash,
                height: block.height,
                tip_height: tip.height,
            });
        }
        Ok(())
    }
}

impl Ledger for MemoryLedger {
    fn best_height(&self) -> u64 {
        self.tip().height
    }

    fn tip(&self) -> &Block {
        // Never empty: construction stores genesis.
        &self.blocks[self.blocks.len() - 1]
    }

    fn append_block(&mut self, block: Block) -> Result<(), LedgerError> {
        self.check_extends_tip(&block)?;
        info!(
            height = block.height,
            block_hash = ?block.hash,
            txs = block.transaction_count(),
            "Block appended"
        );
        self.push(block);
        Ok(())
    }

    fn verify_block(&self, block: &Block) -> bool {
        if let Err(e) = self.check_extends_tip(block) {
            debug!(error = %e, "Block rejected");
            return false;
        }

        let mut seen_txs = HashSet::new();
        let mut spent: HashSet<OutPoint> = HashSet::new();
        for tx in &block.transactions {
            if !seen_txs.insert(tx.id) || self.transactions.contains(&tx.id) {
                debug!(block_hash = ?block.hash, tx_id = ?tx.id, "Duplicate transaction in block");
                return false;
            }
            if !self.verify_transaction(tx) {
                debug!(block_hash = ?block.hash, tx_id = ?tx.id, "Block carries invalid transaction");
                return false;
            }
            for input in &tx.inputs {
                if !spent.insert(input.outpoint()) {
                    debug!(
                        block_hash = ?block.hash,
                        txid = ?input.txid,
                        vout = input.vout,
                        "Output spent twice in block"
                    );
                    return false;
                }
            }
        }
        true
    }

    fn verify_transaction(&self, tx: &Transaction) -> bool {
        if !tx.has_valid_id() {
            trace!(tx_id = ?tx.id, "Transaction id does not match content");
            return false;
        }
        if tx.outputs.is_empty() {
            return false;
        }
        if tx.is_reward() {
            return true;
        }

        let mut inputs = HashSet::new();
        let mut input_total: u64 = 0;
        for input in &tx.inputs {
            if !inputs.insert(input.outpoint()) {
                return false;
            }
            match self.utxos.get(&input.outpoint()) {
                Some(output) if output.owner == input.owner => {
                    input_total = input_total.saturating_add(output.value);
                }
                _ => {
                    trace!(
                        tx_id = ?tx.id,
                        txid = ?input.txid,
                        vout = input.vout,
                        "Input does not spend an owned unspent output"
                    );
                    return false;
                }
            }
        }
        tx.output_total() <= input_total
    }

    fn find_block_by_hash(&self, hash: &Hash) -> Option<&Block> {
        self.by_hash.get(hash).map(|&index| &self.blocks[index])
    }

    fn contains_transaction(&self, id: &Hash) -> bool {
        self.transactions.contains(id)
    }

    fn block_hashes(&self) -> Vec<Hash> {
        self.blocks.iter().map(|b| b.hash).collect()
    }

    fn rebuild_utxo_index(&mut self) {
        self.utxos.rebuild(&self.blocks);
        trace!(
            height = self.best_height(),
            outputs = self.utxos.len(),
            "Rebuilt spendable-output index"
        );
    }

    fn build_block(&self, transactions: Vec<Transaction>, timestamp: u64) -> Block {
        let tip = self.tip();
        Block::new(tip.height + 1, tip.hash, timestamp, transactions)
    }

    fn add_synced_block(&mut self, block: Block) -> bool {
        if self.by_hash.contains_key(&block.hash) {
            trace!(block_hash = ?block.hash, "Synced block already stored");
            return false;
        }
        match self.append_block(block) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "Ignoring synced block");
                false
            }
        }
    }
}
