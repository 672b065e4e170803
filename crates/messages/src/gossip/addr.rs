//! Peer address gossip.

use crate::{Command, NetworkMessage};
use sbor::prelude::BasicSbor;

/// Addresses of peers the sender knows about.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct AddrGossip {
    pub addresses: Vec<String>,
}

impl AddrGossip {
    pub fn new(addresses: Vec<String>) -> Self {
        Self { addresses }
    }
}

impl NetworkMessage for AddrGossip {
    fn command() -> Command {
        Command::Addr
    }
}
