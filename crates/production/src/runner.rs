//! Production runner.
//!
//! A single task owns the [`NodeStateMachine`] and drives it from three
//! sources, in priority order: shutdown, timers, and the network event
//! channel fed by the TCP transport. Internal events produced while
//! handling an event are drained before the next external input.

use crate::network::{encode_message, TcpTransport, TransportError, MAX_FRAME_SIZE};
use crate::timers::TimerManager;
use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokoin_core::{Action, Event, OutboundMessage, StateMachine};
use tokoin_node::NodeStateMachine;
use tokoin_types::Block;
use tracing::{debug, info, trace, warn};

/// Errors from the production runner.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Build error: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Handle used to stop a running [`ProductionRunner`].
///
/// Dropping the handle also triggers shutdown.
pub struct ShutdownHandle {
    tx: Option<oneshot::Sender<()>>,
}

impl ShutdownHandle {
    /// Trigger shutdown (consumes the handle).
    pub fn shutdown(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for ShutdownHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Builder for constructing a [`ProductionRunner`].
///
/// Required fields:
/// - `state` - The node state machine to drive
///
/// Optional fields:
/// - `listener` - A pre-bound socket; otherwise the node's own address is bound
/// - `channel_capacity` - Event channel capacity (default 10 000)
/// - `max_frame_size` - Largest accepted inbound frame
/// - `committed_blocks` - Receives every committed block
pub struct ProductionRunnerBuilder {
    state: Option<NodeStateMachine>,
    listener: Option<TcpListener>,
    channel_capacity: usize,
    max_frame_size: usize,
    committed_tx: Option<mpsc::UnboundedSender<Block>>,
}

impl ProductionRunnerBuilder {
    fn new() -> Self {
        Self {
            state: None,
            listener: None,
            channel_capacity: 10_000,
            max_frame_size: MAX_FRAME_SIZE,
            committed_tx: None,
        }
    }

    pub fn state(mut self, state: NodeStateMachine) -> Self {
        self.state = Some(state);
        self
    }

    pub fn listener(mut self, listener: TcpListener) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    pub fn committed_blocks(mut self, tx: mpsc::UnboundedSender<Block>) -> Self {
        self.committed_tx = Some(tx);
        self
    }

    /// Build the runner and the handle that stops it.
    pub fn build(self) -> Result<(ProductionRunner, ShutdownHandle), RunnerError> {
        let state = self
            .state
            .ok_or_else(|| RunnerError::Build("state is required".into()))?;
        if self.channel_capacity == 0 {
            return Err(RunnerError::Build("channel capacity must be positive".into()));
        }

        let (event_tx, event_rx) = mpsc::channel(self.channel_capacity);
        let (timer_tx, timer_rx) = mpsc::channel(self.channel_capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let runner = ProductionRunner {
            state,
            listener: self.listener,
            event_rx,
            timer_rx,
            shutdown_rx,
            timers: TimerManager::new(timer_tx),
            transport: TcpTransport::new(event_tx, self.max_frame_size),
            internal: VecDeque::new(),
            loopback: VecDeque::new(),
            committed_tx: self.committed_tx,
        };
        let handle = ShutdownHandle {
            tx: Some(shutdown_tx),
        };
        Ok((runner, handle))
    }
}

/// Drives one node over real sockets and wall-clock timers.
pub struct ProductionRunner {
    state: NodeStateMachine,
    listener: Option<TcpListener>,
    event_rx: mpsc::Receiver<Event>,
    timer_rx: mpsc::Receiver<Event>,
    shutdown_rx: oneshot::Receiver<()>,
    timers: TimerManager,
    transport: TcpTransport,
    /// Events from `Action::EnqueueInternal`, handled before anything else.
    internal: VecDeque<Event>,
    /// Messages this node addressed to itself.
    loopback: VecDeque<Event>,
    committed_tx: Option<mpsc::UnboundedSender<Block>>,
}

impl ProductionRunner {
    pub fn builder() -> ProductionRunnerBuilder {
        ProductionRunnerBuilder::new()
    }

    pub fn state(&self) -> &NodeStateMachine {
        &self.state
    }

    /// Run until the [`ShutdownHandle`] fires or is dropped.
    ///
    /// The runner holds senders for both of its channels through the
    /// transport and the timer manager, so shutdown is the only way out.
    pub async fn run(mut self) -> Result<(), RunnerError> {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => TcpTransport::bind(self.state.address()).await?,
        };
        info!(
            address = self.state.address(),
            validators = self.state.bft().validators().len(),
            best_height = self.state.ledger().best_height(),
            "Starting production runner"
        );
        let accept = self.transport.listen(listener);

        self.dispatch(Event::NodeStarted);

        loop {
            self.drain_local();

            tokio::select! {
                biased;

                _ = &mut self.shutdown_rx => {
                    info!("Shutdown signal received");
                    break;
                }

                Some(event) = self.timer_rx.recv() => {
                    self.dispatch(event);
                }

                Some(event) = self.event_rx.recv() => {
                    self.dispatch(event);
                }
            }
        }

        self.timers.cancel_all();
        accept.abort();
        info!(
            height = self.state.bft().height(),
            best_height = self.state.ledger().best_height(),
            "Production runner stopped"
        );
        Ok(())
    }

    /// Handle queued internal events, then self-addressed messages.
    fn drain_local(&mut self) {
        loop {
            let event = match self.internal.pop_front() {
                Some(event) => event,
                None => match self.loopback.pop_front() {
                    Some(event) => event,
                    None => return,
                },
            };
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        self.state.set_time(now);

        trace!(event = event.type_name(), "Handling event");
        let actions = self.state.handle(event);
        for action in actions {
            self.process_action(action);
        }
    }

    fn process_action(&mut self, action: Action) {
        match action {
            Action::Send { to, message } => self.send(to, message),

            Action::BroadcastToValidators { message } => {
                let recipients = self.state.bft().validators().addresses().to_vec();
                for to in recipients {
                    self.send(to, message.clone());
                }
            }

            Action::SetTimer { id, duration } => self.timers.set_timer(id, duration),

            Action::EnqueueInternal { event } => self.internal.push_back(event),

            Action::EmitCommittedBlock { block } => {
                info!(
                    height = block.height,
                    block_hash = ?block.hash,
                    txs = block.transaction_count(),
                    "Block committed"
                );
                if let Some(tx) = &self.committed_tx {
                    let _ = tx.send(block);
                }
            }
        }
    }

    fn send(&mut self, to: String, message: OutboundMessage) {
        if to == self.state.address() {
            self.loopback.push_back(message.into_event());
            return;
        }
        match encode_message(&message) {
            Ok(frame) => {
                debug!(peer = %to, message = message.type_name(), "Sending");
                self.transport.send(to, frame);
            }
            Err(e) => warn!(peer = %to, message = message.type_name(), error = %e, "Failed to encode message"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokoin_bft::BftConfig;
    use tokoin_ledger::MemoryLedger;
    use tokoin_messages::TransactionGossip;
    use tokoin_types::test_utils::test_reward;
    use tokoin_types::ValidatorSet;

    #[test]
    fn test_builder_requires_state() {
        assert!(matches!(
            ProductionRunner::builder().build(),
            Err(RunnerError::Build(_))
        ));
    }

    #[tokio::test]
    async fn test_dropping_shutdown_handle_stops_runner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let me = listener.local_addr().unwrap().to_string();
        let state = NodeStateMachine::new(
            me.clone(),
            me.clone(),
            ValidatorSet::new(vec![me]),
            BftConfig::default(),
            Box::new(MemoryLedger::new()),
        );
        let (runner, shutdown) = ProductionRunner::builder()
            .state(state)
            .listener(listener)
            .build()
            .unwrap();
        let task = tokio::spawn(runner.run());

        drop(shutdown);
        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("runner did not stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_single_validator_commits_submitted_transaction() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let me = listener.local_addr().unwrap().to_string();

        let state = NodeStateMachine::new(
            me.clone(),
            me.clone(),
            ValidatorSet::new(vec![me.clone()]),
            BftConfig::new().with_timeouts(Duration::from_millis(200)),
            Box::new(MemoryLedger::new()),
        );
        let (committed_tx, mut committed_rx) = mpsc::unbounded_channel();
        let (runner, shutdown) = ProductionRunner::builder()
            .state(state)
            .listener(listener)
            .committed_blocks(committed_tx)
            .build()
            .unwrap();
        let task = tokio::spawn(runner.run());

        let tx = test_reward("alice", 1);
        let frame = encode_message(&OutboundMessage::Transaction(Box::new(
            TransactionGossip::new("client", tx.clone()),
        )))
        .unwrap();
        let mut stream = tokio::net::TcpStream::connect(&me).await.unwrap();
        stream.write_all(&frame).await.unwrap();
        stream.shutdown().await.unwrap();

        let block = tokio::time::timeout(Duration::from_secs(5), committed_rx.recv())
            .await
            .expect("timeout")
            .expect("channel closed");
        assert_eq!(block.height, 1);
        assert!(block.contains_transaction(&tx.id));

        shutdown.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("runner did not stop")
            .unwrap();
        assert!(result.is_ok());
    }
}
