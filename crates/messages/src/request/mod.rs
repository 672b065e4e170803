//! Requests answered by a single peer.

mod block;
mod proposal;

pub use block::{GetBlocksRequest, GetDataRequest};
pub use proposal::GetProposalRequest;
