//! Mempool storage.

use indexmap::IndexMap;
use tokoin_types::{Block, Hash, Transaction};
use tracing::{debug, trace};

/// Pending transactions keyed by id, in arrival order.
#[derive(Debug, Default)]
pub struct Mempool {
    pool: IndexMap<Hash, Transaction>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a transaction. Returns `false` if it was already pending.
    pub fn insert(&mut self, tx: Transaction) -> bool {
        if self.pool.contains_key(&tx.id) {
            trace!(tx_id = ?tx.id, "Transaction already pending");
            return false;
        }
        debug!(tx_id = ?tx.id, pool_size = self.pool.len() + 1, "Transaction added to mempool");
        self.pool.insert(tx.id, tx);
        true
    }

    pub fn remove(&mut self, id: &Hash) -> Option<Transaction> {
        self.pool.shift_remove(id)
    }

    /// Drop every transaction included in a committed block.
    ///
    /// Returns the number of transactions removed.
    pub fn remove_committed(&mut self, block: &Block) -> usize {
        let before = self.pool.len();
        for tx in &block.transactions {
            self.pool.shift_remove(&tx.id);
        }
        let removed = before - self.pool.len();
        if removed > 0 {
            debug!(
                height = block.height,
                removed = removed,
                remaining = self.pool.len(),
                "Purged committed transactions"
            );
        }
        removed
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.pool.contains_key(id)
    }

    pub fn get(&self, id: &Hash) -> Option<&Transaction> {
        self.pool.get(id)
    }

    /// All pending transactions in arrival order.
    pub fn all_pending(&self) -> Vec<Transaction> {
        self.pool.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}
