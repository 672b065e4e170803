//! Core types for the Tokoin node.
//!
//! Everything here is plain data: hashes, blocks, transactions, consensus
//! messages and the fixed validator set. No I/O and no consensus logic.

mod block;
mod consensus;
mod hash;
mod transaction;
mod validator;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use block::{Block, GENESIS_OWNER};
pub use consensus::{Precommit, Prevote, Proposal, Step};
pub use hash::{Hash, HexError};
pub use transaction::{OutPoint, Transaction, TxInput, TxOutput, BLOCK_REWARD};
pub use validator::ValidatorSet;
