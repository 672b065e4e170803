//! Test fixtures shared across crates.

use crate::{Block, Hash, Transaction, TxInput, TxOutput, ValidatorSet, BLOCK_REWARD};

/// The four-validator localhost set used throughout the tests.
pub fn test_validators() -> ValidatorSet {
    ValidatorSet::localhost()
}

/// Address of validator `index` in [`test_validators`].
pub fn test_address(index: usize) -> String {
    format!("localhost:300{}", index)
}

/// A reward transaction paying [`BLOCK_REWARD`] to `owner`.
pub fn test_reward(owner: &str, nonce: u64) -> Transaction {
    Transaction::reward(owner, BLOCK_REWARD, nonce)
}

/// Spend output `vout` of `prev` (owned by `from`), sending `amount` to `to`
/// and the rest back to `from`.
pub fn test_transfer(prev: &Transaction, vout: u32, from: &str, to: &str, amount: u64) -> Transaction {
    let available = prev.outputs[vout as usize].value;
    let mut outputs = vec![TxOutput {
        value: amount,
        owner: to.to_string(),
    }];
    if available > amount {
        outputs.push(TxOutput {
            value: available - amount,
            owner: from.to_string(),
        });
    }
    Transaction::new(
        vec![TxInput {
            txid: prev.id,
            vout,
            owner: from.to_string(),
        }],
        outputs,
    )
}

/// A block on top of `parent` carrying `transactions`.
pub fn test_block(parent: &Block, transactions: Vec<Transaction>) -> Block {
    Block::new(
        parent.height + 1,
        parent.hash,
        parent.timestamp + 1_000,
        transactions,
    )
}

/// A deterministic hash derived from a label.
pub fn test_hash(label: &str) -> Hash {
    Hash::digest(label.as_bytes())
}
