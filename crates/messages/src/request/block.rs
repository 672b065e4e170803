//! Block and transaction fetch requests.

use crate::{Command, InventoryKind, NetworkMessage};
use sbor::prelude::BasicSbor;
use tokoin_types::Hash;

/// Ask a peer for the hashes of every block it holds.
///
/// Answered with a block [`InventoryGossip`](crate::InventoryGossip).
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct GetBlocksRequest {
    pub from: String,
}

impl GetBlocksRequest {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

impl NetworkMessage for GetBlocksRequest {
    fn command() -> Command {
        Command::GetBlocks
    }
}

/// Ask a peer for one block or transaction by id.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct GetDataRequest {
    pub from: String,
    pub kind: InventoryKind,
    pub id: Hash,
}

impl GetDataRequest {
    pub fn block(from: impl Into<String>, hash: Hash) -> Self {
        Self {
            from: from.into(),
            kind: InventoryKind::Block,
            id: hash,
        }
    }

    pub fn transaction(from: impl Into<String>, id: Hash) -> Self {
        Self {
            from: from.into(),
            kind: InventoryKind::Tx,
            id,
        }
    }
}

impl NetworkMessage for GetDataRequest {
    fn command() -> Command {
        Command::GetData
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_data_request() {
        let hash = Hash::digest(b"test_block");
        let request = GetDataRequest::block("localhost:3002", hash);
        assert_eq!(request.kind, InventoryKind::Block);
        assert_eq!(request.id, hash);
        assert_eq!(GetDataRequest::transaction("localhost:3002", hash).kind, InventoryKind::Tx);
    }
}
