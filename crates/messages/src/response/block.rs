//! Block fetch response.

use crate::{Command, NetworkMessage};
use sbor::prelude::BasicSbor;
use tokoin_types::Block;

/// A full block served in reply to `getdata`.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct BlockResponse {
    pub from: String,
    pub block: Block,
}

impl BlockResponse {
    pub fn new(from: impl Into<String>, block: Block) -> Self {
        Self {
            from: from.into(),
            block,
        }
    }
}

impl NetworkMessage for BlockResponse {
    fn command() -> Command {
        Command::Block
    }
}
