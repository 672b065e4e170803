//! Tokoin node binary.
//!
//! # Usage
//!
//! ```bash
//! # Run the validator listening on localhost:3001
//! tokoin-node start-node --node-id 3001 --miner alice
//!
//! # Hand a reward transaction to a running node
//! tokoin-node submit --to localhost:3000 --owner alice --amount 10
//! ```
//!
//! # Configuration
//!
//! `--config` points at an optional TOML file; see [`NodeConfig`] for the
//! sections. Without one, the node joins the four-validator localhost
//! network seeded at `localhost:3000`.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokoin_core::OutboundMessage;
use tokoin_ledger::MemoryLedger;
use tokoin_messages::TransactionGossip;
use tokoin_node::NodeStateMachine;
use tokoin_production::network::encode_message;
use tokoin_production::{init_logging, NodeConfig, ProductionRunner};
use tokoin_types::{Transaction, BLOCK_REWARD};
use tracing::info;

/// Tokoin Tendermint node
#[derive(Parser, Debug)]
#[command(name = "tokoin-node")]
#[command(about = "Run a Tokoin validator node or submit transactions to one")]
#[command(version)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "info", "tokoin_bft=debug")
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a validator node
    StartNode {
        /// Port to listen on; the node is known as localhost:<port>
        #[arg(long)]
        node_id: u16,

        /// Owner of the reward in blocks this node proposes
        #[arg(long)]
        miner: Option<String>,

        /// Path to a TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Submit a reward transaction to a node
    Submit {
        /// Address of the receiving node
        #[arg(long)]
        to: String,

        /// Owner of the new output
        #[arg(long)]
        owner: String,

        #[arg(long, default_value_t = BLOCK_REWARD)]
        amount: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level).context("Failed to initialize logging")?;

    match cli.command {
        Command::StartNode {
            node_id,
            miner,
            config,
        } => start_node(node_id, miner, config).await,
        Command::Submit { to, owner, amount } => submit(&to, &owner, amount).await,
    }
}

async fn start_node(node_id: u16, miner: Option<String>, config: Option<PathBuf>) -> Result<()> {
    let config = match config {
        Some(path) => NodeConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => NodeConfig::default(),
    };

    let me = config.address_for_port(node_id);
    let validators = config.validator_set();
    if !validators.contains(&me) {
        bail!("{} is not in the validator set {:?}", me, validators.addresses());
    }

    info!(
        address = %me,
        seed = %config.network.seed,
        validators = validators.len(),
        fault_number = validators.fault_number(),
        "Node configuration loaded"
    );

    let mut state = NodeStateMachine::new(
        me,
        config.network.seed.clone(),
        validators,
        config.bft_config(),
        Box::new(MemoryLedger::new()),
    );
    if let Some(miner) = miner.or_else(|| config.node.miner.clone()) {
        state = state.with_miner(miner);
    }

    let (runner, shutdown) = ProductionRunner::builder()
        .state(state)
        .channel_capacity(config.network.channel_capacity)
        .max_frame_size(config.network.max_frame_size)
        .build()
        .context("Failed to build runner")?;
    let mut task = tokio::spawn(runner.run());

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for shutdown signal")?;
            info!("Received Ctrl+C, shutting down");
            shutdown.shutdown();
            task.await.context("Runner task panicked")??;
        }
        result = &mut task => {
            result.context("Runner task panicked")??;
        }
    }
    Ok(())
}

async fn submit(to: &str, owner: &str, amount: u64) -> Result<()> {
    // The nonce only needs to make repeated submissions distinct.
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock before UNIX epoch")?
        .as_nanos() as u64;
    let tx = Transaction::reward(owner, amount, nonce);
    let frame = encode_message(&OutboundMessage::Transaction(Box::new(
        TransactionGossip::new("client", tx.clone()),
    )))?;

    let mut stream = TcpStream::connect(to)
        .await
        .with_context(|| format!("Failed to connect to {}", to))?;
    stream.write_all(&frame).await?;
    stream.shutdown().await?;

    info!(to = %to, tx_id = %tx.id, owner = %owner, amount = amount, "Transaction submitted");
    Ok(())
}
