//! Block bodies keyed by hash.

use std::collections::HashMap;
use tokoin_types::{Block, Hash};

/// Block bodies received from proposers at the current height.
///
/// Votes and proposals only carry a hash; the body is looked up here when
/// the block has to be verified or committed.
#[derive(Debug, Default)]
pub struct BlockCache {
    blocks: HashMap<Hash, Block>,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a block under its hash. A second body for the same hash replaces the first.
    pub fn insert(&mut self, block: Block) {
        self.blocks.insert(block.hash, block);
    }

    pub fn get(&self, hash: &Hash) -> Option<&Block> {
        self.blocks.get(hash)
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.blocks.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Drop every cached body.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}
