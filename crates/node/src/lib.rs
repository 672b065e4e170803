//! Combined node state machine.
//!
//! This crate composes the Tendermint state machine, the mempool, the
//! ledger, the peer registry and block sync into a complete validator.

mod peers;
mod state;
mod sync;

pub use peers::PeerRegistry;
pub use state::NodeStateMachine;
pub use sync::BlockSync;
