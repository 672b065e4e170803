//! Block type.

use crate::{Hash, Transaction, BLOCK_REWARD};
use sbor::prelude::*;

/// Owner of the genesis reward output.
pub const GENESIS_OWNER: &str = "genesis";

/// A block in the linear chain.
///
/// `hash` covers every other field; blocks are addressed by it in the
/// block cache, in votes and in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Block {
    /// Ledger height (genesis = 0).
    pub height: u64,

    /// Hash of the parent block.
    pub prev_hash: Hash,

    /// Unix timestamp (milliseconds) when the block was built.
    pub timestamp: u64,

    /// Transactions included in this block.
    pub transactions: Vec<Transaction>,

    /// Content hash, see [`Block::compute_hash`].
    pub hash: Hash,
}

impl Block {
    /// Build a block and compute its hash.
    pub fn new(height: u64, prev_hash: Hash, timestamp: u64, transactions: Vec<Transaction>) -> Self {
        let mut block = Self {
            height,
            prev_hash,
            timestamp,
            transactions,
            hash: Hash::ZERO,
        };
        block.hash = block.compute_hash();
        block
    }

    /// The genesis block shared by every validator.
    pub fn genesis() -> Self {
        Self::new(
            0,
            Hash::ZERO,
            0,
            vec![Transaction::reward(GENESIS_OWNER, BLOCK_REWARD, 0)],
        )
    }

    /// Hash of the header fields and transaction ids.
    pub fn compute_hash(&self) -> Hash {
        let tx_ids: Vec<Hash> = self.transactions.iter().map(|tx| tx.id).collect();
        let ids = basic_encode(&tx_ids).expect("Hash list serialization should never fail");
        Hash::digest_parts(&[
            &self.height.to_le_bytes(),
            self.prev_hash.as_bytes(),
            &self.timestamp.to_le_bytes(),
            &ids,
        ])
    }

    /// Whether the stored hash matches the content.
    pub fn has_valid_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    /// Check if this is the genesis block.
    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Ids of the transactions in this block.
    pub fn transaction_ids(&self) -> Vec<Hash> {
        self.transactions.iter().map(|tx| tx.id).collect()
    }

    /// Get number of transactions in this block.
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Check if this block contains a specific transaction.
    pub fn contains_transaction(&self, id: &Hash) -> bool {
        self.transactions.iter().any(|tx| &tx.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_is_deterministic() {
        let a = Block::genesis();
        let b = Block::genesis();
        assert_eq!(a.hash, b.hash);
        assert!(a.is_genesis());
        assert!(a.has_valid_hash());
        assert_eq!(a.transaction_count(), 1);
    }

    #[test]
    fn test_hash_covers_transactions() {
        let genesis = Block::genesis();
        let tx = Transaction::reward("miner", BLOCK_REWARD, 1);
        let block = Block::new(1, genesis.hash, 1_000, vec![tx.clone()]);
        assert!(block.contains_transaction(&tx.id));

        let mut tampered = block.clone();
        tampered.transactions.push(Transaction::reward("thief", 1_000, 2));
        assert!(!tampered.has_valid_hash());
    }
}
