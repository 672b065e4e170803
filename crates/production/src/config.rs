//! Node configuration file.
//!
//! Every section and field is optional; an empty file yields the
//! four-validator localhost network with the seed at `localhost:3000`.
//!
//! ```toml
//! [node]
//! address = "localhost:3001"
//! miner = "alice"
//!
//! [network]
//! seed = "localhost:3000"
//! validators = ["localhost:3000", "localhost:3001", "localhost:3002", "localhost:3003"]
//!
//! [consensus]
//! fault_number = 1
//! propose_timeout_ms = 5000
//! ```

use crate::network::MAX_FRAME_SIZE;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokoin_bft::BftConfig;
use tokoin_types::ValidatorSet;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub node: NodeSection,

    #[serde(default)]
    pub network: NetworkSection,

    #[serde(default)]
    pub consensus: ConsensusSection,
}

/// Identity of this node.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeSection {
    /// Address this node listens on and is known by, e.g. `localhost:3001`.
    #[serde(default)]
    pub address: Option<String>,

    /// Owner of the reward in blocks this node proposes.
    #[serde(default)]
    pub miner: Option<String>,
}

/// Peers and transport limits.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSection {
    /// First known peer; every other node introduces itself here.
    #[serde(default = "default_seed")]
    pub seed: String,

    /// The fixed validator set, in proposer order.
    #[serde(default = "default_validators")]
    pub validators: Vec<String>,

    /// Largest accepted inbound frame in bytes
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,

    /// Capacity of the runner's event channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            validators: default_validators(),
            max_frame_size: default_max_frame_size(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_seed() -> String {
    "localhost:3000".to_string()
}

fn default_validators() -> Vec<String> {
    ValidatorSet::localhost().addresses().to_vec()
}

fn default_max_frame_size() -> usize {
    MAX_FRAME_SIZE
}

fn default_channel_capacity() -> usize {
    10_000
}

/// Consensus parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ConsensusSection {
    /// Tolerated faults `f`. Defaults to `(N-1)/3`.
    #[serde(default)]
    pub fault_number: Option<u64>,

    #[serde(default = "default_timeout_ms")]
    pub propose_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub prevote_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub precommit_timeout_ms: u64,

    /// Round bound per height. Defaults to the validator count.
    #[serde(default)]
    pub max_rounds: Option<u64>,
}

impl Default for ConsensusSection {
    fn default() -> Self {
        Self {
            fault_number: None,
            propose_timeout_ms: default_timeout_ms(),
            prevote_timeout_ms: default_timeout_ms(),
            precommit_timeout_ms: default_timeout_ms(),
            max_rounds: None,
        }
    }
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values a node cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let validators = &self.network.validators;
        if validators.is_empty() {
            return Err(ConfigError::Invalid("validator list is empty".into()));
        }
        if let Some(f) = self.consensus.fault_number {
            if 3 * f + 1 > validators.len() as u64 {
                return Err(ConfigError::Invalid(format!(
                    "fault number {} needs at least {} validators, got {}",
                    f,
                    3 * f + 1,
                    validators.len()
                )));
            }
        }
        if self.network.channel_capacity == 0 {
            return Err(ConfigError::Invalid("channel capacity must be positive".into()));
        }
        Ok(())
    }

    /// This node's address: the configured one, else `localhost:<port>`.
    pub fn address_for_port(&self, port: u16) -> String {
        self.node
            .address
            .clone()
            .unwrap_or_else(|| format!("localhost:{}", port))
    }

    pub fn validator_set(&self) -> ValidatorSet {
        let set = ValidatorSet::new(self.network.validators.clone());
        match self.consensus.fault_number {
            Some(f) => set.with_fault_number(f),
            None => set,
        }
    }

    pub fn bft_config(&self) -> BftConfig {
        let consensus = &self.consensus;
        let config = BftConfig::new()
            .with_propose_timeout(Duration::from_millis(consensus.propose_timeout_ms))
            .with_prevote_timeout(Duration::from_millis(consensus.prevote_timeout_ms))
            .with_precommit_timeout(Duration::from_millis(consensus.precommit_timeout_ms));
        match consensus.max_rounds {
            Some(max_rounds) => config.with_max_rounds(max_rounds),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_localhost_defaults() {
        let config = NodeConfig::from_toml_str("").unwrap();
        assert_eq!(config.network.seed, "localhost:3000");
        assert_eq!(config.validator_set(), ValidatorSet::localhost());
        assert_eq!(config.address_for_port(3002), "localhost:3002");
        assert_eq!(config.network.max_frame_size, MAX_FRAME_SIZE);

        let bft = config.bft_config();
        assert_eq!(bft.propose_timeout, Duration::from_secs(5));
        assert_eq!(bft.max_rounds, None);
    }

    #[test]
    fn test_sections_override_defaults() {
        let config = NodeConfig::from_toml_str(
            r#"
            [node]
            address = "10.0.0.7:4000"
            miner = "alice"

            [network]
            seed = "10.0.0.1:4000"
            validators = ["10.0.0.1:4000", "10.0.0.7:4000", "10.0.0.9:4000", "10.0.0.11:4000"]

            [consensus]
            fault_number = 1
            prevote_timeout_ms = 250
            max_rounds = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.address_for_port(3000), "10.0.0.7:4000");
        assert_eq!(config.node.miner.as_deref(), Some("alice"));
        assert_eq!(config.network.seed, "10.0.0.1:4000");

        let validators = config.validator_set();
        assert_eq!(validators.len(), 4);
        assert_eq!(validators.fault_number(), 1);

        let bft = config.bft_config();
        assert_eq!(bft.prevote_timeout, Duration::from_millis(250));
        assert_eq!(bft.propose_timeout, Duration::from_secs(5));
        assert_eq!(bft.max_rounds, Some(2));
    }

    #[test]
    fn test_rejects_unsafe_fault_number() {
        let result = NodeConfig::from_toml_str(
            r#"
            [consensus]
            fault_number = 2
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(matches!(
            NodeConfig::from_toml_str("[network\nseed ="),
            Err(ConfigError::Parse(_))
        ));
    }
}
