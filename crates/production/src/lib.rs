//! Production runner with async I/O.
//!
//! This crate wraps the deterministic [`NodeStateMachine`] with real I/O:
//!
//! - Network messages over TCP, one frame per connection
//! - Consensus timeouts via tokio timers
//! - Configuration from TOML and logging via `tracing-subscriber`
//!
//! # Architecture
//!
//! Uses the event aggregator pattern: a single task owns the state machine
//! and receives events via mpsc channels. This avoids shared state.
//!
//! ```text
//!   TCP accept loop ──┐
//!                     ├──► event channel ──► ProductionRunner
//!   timer tasks ──────┘                        └─ state.handle(event) → actions
//!                                                   ├─ Send / Broadcast → TCP dial
//!                                                   ├─ SetTimer → timer task
//!                                                   └─ EnqueueInternal → local queue
//! ```
//!
//! [`NodeStateMachine`]: tokoin_node::NodeStateMachine

pub mod config;
pub mod network;
mod runner;
pub mod telemetry;
mod timers;

pub use config::{ConfigError, NodeConfig};
pub use runner::{ProductionRunner, ProductionRunnerBuilder, RunnerError, ShutdownHandle};
pub use telemetry::{init_logging, TelemetryError};
pub use timers::TimerManager;
