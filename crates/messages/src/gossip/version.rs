//! Handshake announcing the sender's chain height.

use crate::{Command, NetworkMessage};
use sbor::prelude::BasicSbor;

/// Protocol version advertised in [`VersionAnnouncement`]. Advisory only.
pub const PROTOCOL_VERSION: u32 = 1;

/// Sent to the seed on startup and in reply to a peer that is behind.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct VersionAnnouncement {
    pub version: u32,
    /// Height of the sender's ledger tip.
    pub best_height: u64,
    pub from: String,
}

impl VersionAnnouncement {
    /// Announce `best_height` at the current protocol version.
    pub fn new(best_height: u64, from: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            best_height,
            from: from.into(),
        }
    }
}

impl NetworkMessage for VersionAnnouncement {
    fn command() -> Command {
        Command::Version
    }
}
