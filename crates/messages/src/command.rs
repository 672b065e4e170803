//! Command tags and the message trait.

use sbor::prelude::BasicSbor;
use std::fmt;

/// Width of the NUL-padded ASCII command tag that prefixes every frame.
pub const COMMAND_LENGTH: usize = 12;

/// The closed set of protocol commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    // ═══════════════════════════════════════════════════════════════════════
    // Peer and block sync
    // ═══════════════════════════════════════════════════════════════════════
    Addr,
    Block,
    Inv,
    GetBlocks,
    GetData,
    Tx,
    Version,

    // ═══════════════════════════════════════════════════════════════════════
    // Consensus
    // ═══════════════════════════════════════════════════════════════════════
    Proposal,
    ProposeBlock,
    GetProposal,
    Prevote,
    Precommit,
}

impl Command {
    /// Every command, in declaration order.
    pub const ALL: [Command; 12] = [
        Command::Addr,
        Command::Block,
        Command::Inv,
        Command::GetBlocks,
        Command::GetData,
        Command::Tx,
        Command::Version,
        Command::Proposal,
        Command::ProposeBlock,
        Command::GetProposal,
        Command::Prevote,
        Command::Precommit,
    ];

    /// The ASCII tag carried on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            Command::Addr => "addr",
            Command::Block => "block",
            Command::Inv => "inv",
            Command::GetBlocks => "getblocks",
            Command::GetData => "getdata",
            Command::Tx => "tx",
            Command::Version => "version",
            Command::Proposal => "proposal",
            Command::ProposeBlock => "proposeBlock",
            Command::GetProposal => "getProposal",
            Command::Prevote => "prevote",
            Command::Precommit => "precommit",
        }
    }

    /// Look up a command by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }

    /// The tag padded with NULs to [`COMMAND_LENGTH`] bytes.
    pub fn to_bytes(&self) -> [u8; COMMAND_LENGTH] {
        let mut bytes = [0u8; COMMAND_LENGTH];
        let tag = self.tag().as_bytes();
        bytes[..tag.len()].copy_from_slice(tag);
        bytes
    }

    /// Parse a padded tag. Trailing NULs are stripped before lookup.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let tag = std::str::from_utf8(&bytes[..end]).ok()?;
        Self::from_tag(tag)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A payload type bound to exactly one command.
pub trait NetworkMessage {
    /// The command this payload travels under.
    fn command() -> Command;
}

/// What an `inv` or `getdata` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, BasicSbor)]
pub enum InventoryKind {
    Block,
    Tx,
}
