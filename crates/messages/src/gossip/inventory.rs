//! Inventory announcement.

use crate::{Command, InventoryKind, NetworkMessage};
use sbor::prelude::BasicSbor;
use tokoin_types::Hash;

/// Lists block hashes or transaction ids the sender can serve.
///
/// Block inventories are ordered genesis first.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct InventoryGossip {
    pub from: String,
    pub kind: InventoryKind,
    pub items: Vec<Hash>,
}

impl InventoryGossip {
    pub fn blocks(from: impl Into<String>, hashes: Vec<Hash>) -> Self {
        Self {
            from: from.into(),
            kind: InventoryKind::Block,
            items: hashes,
        }
    }

    pub fn transactions(from: impl Into<String>, ids: Vec<Hash>) -> Self {
        Self {
            from: from.into(),
            kind: InventoryKind::Tx,
            items: ids,
        }
    }
}

impl NetworkMessage for InventoryGossip {
    fn command() -> Command {
        Command::Inv
    }
}
