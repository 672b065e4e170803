//! Block download bookkeeping.

use std::collections::VecDeque;
use tokoin_types::Hash;

/// Block hashes announced by a peer that still have to be fetched.
///
/// Blocks are requested one at a time, in announcement order, from the
/// peer that announced them.
#[derive(Debug, Default)]
pub struct BlockSync {
    in_transit: VecDeque<Hash>,
}

impl BlockSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the in-transit list and return the first hash to request.
    pub fn begin(&mut self, hashes: impl IntoIterator<Item = Hash>) -> Option<Hash> {
        self.in_transit = hashes.into_iter().collect();
        self.in_transit.pop_front()
    }

    /// The next hash to request, if any remain.
    pub fn next_block(&mut self) -> Option<Hash> {
        self.in_transit.pop_front()
    }

    pub fn is_syncing(&self) -> bool {
        !self.in_transit.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.in_transit.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokoin_types::test_utils::test_hash;

    #[test]
    fn test_walks_announced_hashes_in_order() {
        let mut sync = BlockSync::new();
        let (a, b, c) = (test_hash("a"), test_hash("b"), test_hash("c"));

        assert_eq!(sync.begin([a, b, c]), Some(a));
        assert_eq!(sync.remaining(), 2);
        assert_eq!(sync.next_block(), Some(b));
        assert_eq!(sync.next_block(), Some(c));
        assert!(!sync.is_syncing());
        assert_eq!(sync.next_block(), None);
    }

    #[test]
    fn test_new_announcement_replaces_list() {
        let mut sync = BlockSync::new();
        sync.begin([test_hash("a"), test_hash("b")]);
        assert_eq!(sync.begin([test_hash("c")]), Some(test_hash("c")));
        assert!(!sync.is_syncing());
        assert_eq!(sync.begin([]), None);
    }
}
