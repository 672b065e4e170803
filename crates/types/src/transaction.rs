//! UTXO-style transactions.

use crate::Hash;
use sbor::prelude::*;

/// Amount minted by a block reward transaction.
pub const BLOCK_REWARD: u64 = 10;

/// Reference to an output of an earlier transaction.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct TxInput {
    /// Id of the transaction that created the output.
    pub txid: Hash,
    /// Index of the output within that transaction.
    pub vout: u32,
    /// Address claiming the output. Must match the output's owner.
    pub owner: String,
}

/// Location of an output: the creating transaction and the output index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, BasicSbor)]
pub struct OutPoint {
    pub txid: Hash,
    pub vout: u32,
}

impl OutPoint {
    pub fn new(txid: Hash, vout: u32) -> Self {
        Self { txid, vout }
    }
}

impl TxInput {
    /// The output this input spends.
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.txid, self.vout)
    }
}

/// A spendable amount locked to an owner address.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct TxOutput {
    /// Amount carried by the output.
    pub value: u64,
    /// Address that may spend the output.
    pub owner: String,
}

/// A transaction moving value between outputs.
///
/// A transaction without inputs is a reward (coinbase) transaction.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct Transaction {
    /// Content hash, see [`Transaction::compute_id`].
    pub id: Hash,
    /// Outputs being spent.
    pub inputs: Vec<TxInput>,
    /// Outputs being created.
    pub outputs: Vec<TxOutput>,
    /// Disambiguates otherwise identical reward transactions.
    pub nonce: u64,
}

impl Transaction {
    /// Build a transaction and compute its id.
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self::with_nonce(inputs, outputs, 0)
    }

    fn with_nonce(inputs: Vec<TxInput>, outputs: Vec<TxOutput>, nonce: u64) -> Self {
        let mut tx = Self {
            id: Hash::ZERO,
            inputs,
            outputs,
            nonce,
        };
        tx.id = tx.compute_id();
        tx
    }

    /// Build a reward transaction paying `amount` to `owner`.
    pub fn reward(owner: impl Into<String>, amount: u64, nonce: u64) -> Self {
        Self::with_nonce(
            vec![],
            vec![TxOutput {
                value: amount,
                owner: owner.into(),
            }],
            nonce,
        )
    }

    /// Hash of the transaction with the id field zeroed.
    pub fn compute_id(&self) -> Hash {
        let unsigned = Self {
            id: Hash::ZERO,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            nonce: self.nonce,
        };
        let bytes = basic_encode(&unsigned).expect("Transaction serialization should never fail");
        Hash::digest(&bytes)
    }

    /// Whether the stored id matches the content.
    pub fn has_valid_id(&self) -> bool {
        self.id == self.compute_id()
    }

    /// Whether this is a reward (coinbase) transaction.
    pub fn is_reward(&self) -> bool {
        self.inputs.is_empty()
    }

    /// Sum of all output values.
    pub fn output_total(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_transaction() {
        let tx = Transaction::reward("alice", BLOCK_REWARD, 1);
        assert!(tx.is_reward());
        assert!(tx.has_valid_id());
        assert_eq!(tx.output_total(), BLOCK_REWARD);
    }

    #[test]
    fn test_nonce_distinguishes_rewards() {
        let a = Transaction::reward("alice", 10, 1);
        let b = Transaction::reward("alice", 10, 2);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_tampered_transaction_has_invalid_id() {
        let mut tx = Transaction::new(
            vec![TxInput {
                txid: Hash::digest(b"prev"),
                vout: 0,
                owner: "alice".into(),
            }],
            vec![TxOutput {
                value: 5,
                owner: "bob".into(),
            }],
        );
        assert!(!tx.is_reward());
        assert!(tx.has_valid_id());

        tx.outputs[0].value = 500;
        assert!(!tx.has_valid_id());
    }
}
