//! Deterministic simulation runner.
//!
//! This crate provides a fully deterministic environment for testing
//! consensus. Given the same seed, it produces identical results every run.
//!
//! # Architecture
//!
//! ```text
//!   EventKey (time, priority, node, sequence)
//!        │
//!        ▼
//!   BTreeMap<EventKey, Event> ──pop──► nodes[i].handle(event)
//!        ▲                                   │
//!        │                                   ▼
//!        └──── schedule at now + latency ── actions
//!              (messages, timers, internal events)
//! ```
//!
//! Every node runs on its own ledger. Latency, jitter and packet loss are
//! drawn from a ChaCha8 generator seeded by the caller.

mod event_queue;
mod network;
mod runner;

pub use event_queue::EventKey;
pub use network::{NetworkConfig, SimulatedNetwork};
pub use runner::{SimulationRunner, SimulationStats, CLIENT_ADDRESS};

/// Type alias for deterministic node indexing in simulation.
///
/// Nodes are addressed by position in the validator set; production code
/// addresses peers by `host:port`.
pub type NodeIndex = u32;
