//! The block store seen from the consensus engine.

use tokoin_types::{Block, Hash, Transaction};

/// Errors returned when a block cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Block {hash} at height {height} does not extend tip at height {tip_height}")]
    DoesNotExtendTip {
        hash: Hash,
        height: u64,
        tip_height: u64,
    },

    #[error("Block {0} has a hash that does not match its content")]
    InvalidHash(Hash),
}

/// Append-only chain of blocks plus the spendable-output index derived
/// from it.
///
/// Heights start at 0 with the genesis block. The index is rebuilt in
/// full after every commit; nothing on the consensus path updates it
/// incrementally.
pub trait Ledger: Send {
    /// Height of the tip block.
    fn best_height(&self) -> u64;

    /// The tip block.
    fn tip(&self) -> &Block;

    /// Append a committed block. The block must extend the tip.
    fn append_block(&mut self, block: Block) -> Result<(), LedgerError>;

    /// Check a candidate block against the tip and the spendable outputs.
    fn verify_block(&self, block: &Block) -> bool;

    /// Check a single transaction against the spendable outputs.
    fn verify_transaction(&self, tx: &Transaction) -> bool;

    fn find_block_by_hash(&self, hash: &Hash) -> Option<&Block>;

    /// Whether a transaction with this id was ever committed.
    fn contains_transaction(&self, id: &Hash) -> bool;

    /// Hashes of every stored block, genesis first.
    fn block_hashes(&self) -> Vec<Hash>;

    /// Recompute the spendable-output index from the full chain.
    fn rebuild_utxo_index(&mut self);

    /// Assemble (but do not store) a block on top of the tip.
    fn build_block(&self, transactions: Vec<Transaction>, timestamp: u64) -> Block;

    /// Store a block fetched during block sync.
    ///
    /// Returns `false` (and stores nothing) unless the block extends the tip.
    fn add_synced_block(&mut self, block: Block) -> bool;
}
