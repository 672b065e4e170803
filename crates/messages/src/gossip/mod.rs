//! Messages pushed to one or more peers without a preceding request.

mod addr;
mod consensus;
mod inventory;
mod transaction;
mod version;

pub use addr::AddrGossip;
pub use consensus::{PrecommitGossip, PrevoteGossip, ProposalGossip, ProposeBlockGossip};
pub use inventory::InventoryGossip;
pub use transaction::TransactionGossip;
pub use version::{VersionAnnouncement, PROTOCOL_VERSION};
