//! Spendable-output index.

use std::collections::BTreeMap;
use tokoin_types::{Block, Hash, OutPoint, TxOutput};

/// Every unspent output of the chain, keyed by location.
#[derive(Debug, Clone, Default)]
pub struct UtxoIndex {
    outputs: BTreeMap<OutPoint, TxOutput>,
}

impl UtxoIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the index from the full chain, genesis first.
    pub fn rebuild<'a>(&mut self, blocks: impl IntoIterator<Item = &'a Block>) {
        self.outputs.clear();
        for block in blocks {
            for tx in &block.transactions {
                for input in &tx.inputs {
                    self.outputs.remove(&input.outpoint());
                }
                for (vout, output) in tx.outputs.iter().enumerate() {
                    self.outputs
                        .insert(OutPoint::new(tx.id, vout as u32), output.clone());
                }
            }
        }
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        self.outputs.get(outpoint)
    }

    pub fn is_unspent(&self, txid: Hash, vout: u32) -> bool {
        self.outputs.contains_key(&OutPoint::new(txid, vout))
    }

    /// Collect outputs owned by `owner` until they cover `amount`.
    ///
    /// Returns the accumulated value and the chosen outputs. The value is
    /// below `amount` when the owner cannot afford it.
    pub fn find_spendable(&self, owner: &str, amount: u64) -> (u64, Vec<OutPoint>) {
        let mut accumulated = 0;
        let mut chosen = Vec::new();
        for (outpoint, output) in &self.outputs {
            if accumulated >= amount {
                break;
            }
            if output.owner == owner {
                accumulated += output.value;
                chosen.push(*outpoint);
            }
        }
        (accumulated, chosen)
    }

    /// Total unspent value owned by `owner`.
    pub fn balance(&self, owner: &str) -> u64 {
        self.outputs
            .values()
            .filter(|output| output.owner == owner)
            .map(|output| output.value)
            .sum()
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}
