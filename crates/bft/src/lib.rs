//! Tendermint consensus state machine.
//!
//! This crate provides a synchronous Tendermint implementation
//! that can be used for both simulation and production.
//!
//! # Architecture
//!
//! The state machine processes events synchronously:
//!
//! - `Event::ProposeBlockReceived` → Cache the body, ask the proposer for its proposal
//! - `Event::ProposalReceived` → Record it, prevote once per round
//! - `Event::PrevoteReceived` → Count, lock and precommit on a 2f+1 quorum
//! - `Event::PrecommitReceived` → Count, commit on a 2f+1 quorum
//! - `Event::Timeout` → Vote nil or move to the next round
//!
//! Any message for a higher round seen f+1 times moves the node into that
//! round. All I/O is performed by the runner via returned `Action`s.

mod block_cache;
mod config;
mod pools;
mod state;
mod timeout;

pub use block_cache::BlockCache;
pub use config::BftConfig;
pub use pools::{ProposalKey, RoundKey, ValueKey, VoteKey, VotePools};
pub use state::TendermintState;
pub use timeout::TimeoutScheduler;
