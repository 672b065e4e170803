//! Network messages for the Tokoin protocol.
//!
//! Every message travels in its own frame, tagged with a [`Command`]. The
//! payload types here are plain SBOR structs; framing lives in the
//! production codec.

mod command;
pub mod gossip;
pub mod request;
pub mod response;

pub use command::{Command, InventoryKind, NetworkMessage, COMMAND_LENGTH};

// Re-export commonly used types
pub use gossip::{
    AddrGossip, InventoryGossip, PrecommitGossip, PrevoteGossip, ProposalGossip,
    ProposeBlockGossip, TransactionGossip, VersionAnnouncement, PROTOCOL_VERSION,
};
pub use request::{GetBlocksRequest, GetDataRequest, GetProposalRequest};
pub use response::BlockResponse;
