//! Fixed validator set and quorum arithmetic.

/// The fixed, ordered set of validators identified by network address.
///
/// Membership never changes. Every validator has equal weight, so quorum
/// checks are plain message counts against `2f+1` and `f+1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatorSet {
    validators: Vec<String>,
    fault_number: u64,
}

impl ValidatorSet {
    /// Create a validator set tolerating the maximum number of faults `(n-1)/3`.
    ///
    /// # Panics
    ///
    /// Panics if `validators` is empty.
    pub fn new(validators: Vec<String>) -> Self {
        assert!(!validators.is_empty(), "validator set must not be empty");
        let fault_number = (validators.len() as u64 - 1) / 3;
        Self {
            validators,
            fault_number,
        }
    }

    /// Four validators on `localhost:3000..3003` tolerating one fault.
    pub fn localhost() -> Self {
        Self::new((0..4).map(|i| format!("localhost:300{}", i)).collect())
    }

    /// Override the configured fault number `f`.
    pub fn with_fault_number(mut self, fault_number: u64) -> Self {
        self.fault_number = fault_number;
        self
    }

    /// Number of validators (N).
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    /// Always false; an empty set is rejected at construction.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Validator addresses in proposer order.
    pub fn addresses(&self) -> &[String] {
        &self.validators
    }

    /// Check if an address belongs to the validator set.
    pub fn contains(&self, address: &str) -> bool {
        self.validators.iter().any(|v| v == address)
    }

    /// The configured fault number `f`.
    pub fn fault_number(&self) -> u64 {
        self.fault_number
    }

    /// Messages required for a quorum (`2f+1`).
    pub fn quorum_threshold(&self) -> u64 {
        2 * self.fault_number + 1
    }

    /// Messages required to skip to a higher round (`f+1`).
    pub fn round_skip_threshold(&self) -> u64 {
        self.fault_number + 1
    }

    /// Check if a count reaches quorum.
    pub fn has_quorum(&self, count: u64) -> bool {
        count >= self.quorum_threshold()
    }

    /// Check if a count reaches the round-skip threshold.
    pub fn has_round_skip(&self, count: u64) -> bool {
        count >= self.round_skip_threshold()
    }

    /// Round-robin proposer for a height and round: `(h + r) mod N`.
    pub fn proposer_for(&self, height: u64, round: u64) -> &str {
        let index = (height.wrapping_add(round) % self.validators.len() as u64) as usize;
        &self.validators[index]
    }

    /// Check if `address` proposes at this height and round.
    pub fn is_proposer(&self, address: &str, height: u64, round: u64) -> bool {
        self.proposer_for(height, round) == address
    }
}
