//! Responses to requests.

mod block;

pub use block::BlockResponse;
