//! BFT configuration.

use std::time::Duration;

/// Configuration for the Tendermint state machine.
#[derive(Debug, Clone)]
pub struct BftConfig {
    /// How long a non-proposer waits for a proposal before prevoting nil.
    pub propose_timeout: Duration,

    /// How long to wait after 2f+1 prevotes of any value before precommitting nil.
    pub prevote_timeout: Duration,

    /// How long to wait after 2f+1 precommits of any value before moving to the next round.
    pub precommit_timeout: Duration,

    /// Rounds at or beyond this bound are never started.
    ///
    /// `None` bounds rounds by the validator count, so every validator
    /// proposes at most once per height.
    pub max_rounds: Option<u64>,
}

impl Default for BftConfig {
    fn default() -> Self {
        Self {
            propose_timeout: Duration::from_secs(5),
            prevote_timeout: Duration::from_secs(5),
            precommit_timeout: Duration::from_secs(5),
            max_rounds: None,
        }
    }
}

impl BftConfig {
    /// Create a new BFT configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set every timeout to the same duration.
    pub fn with_timeouts(mut self, timeout: Duration) -> Self {
        self.propose_timeout = timeout;
        self.prevote_timeout = timeout;
        self.precommit_timeout = timeout;
        self
    }

    /// Set the propose timeout.
    pub fn with_propose_timeout(mut self, timeout: Duration) -> Self {
        self.propose_timeout = timeout;
        self
    }

    /// Set the prevote timeout.
    pub fn with_prevote_timeout(mut self, timeout: Duration) -> Self {
        self.prevote_timeout = timeout;
        self
    }

    /// Set the precommit timeout.
    pub fn with_precommit_timeout(mut self, timeout: Duration) -> Self {
        self.precommit_timeout = timeout;
        self
    }

    /// Bound the number of rounds per height.
    pub fn with_max_rounds(mut self, max_rounds: u64) -> Self {
        self.max_rounds = Some(max_rounds);
        self
    }
}
