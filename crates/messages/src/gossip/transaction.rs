//! Transaction gossip message.

use crate::{Command, NetworkMessage};
use sbor::prelude::BasicSbor;
use tokoin_types::Transaction;

/// Carries a full transaction, either submitted by a client or served in
/// reply to `getdata`.
#[derive(Debug, Clone, PartialEq, Eq, BasicSbor)]
pub struct TransactionGossip {
    pub from: String,
    pub transaction: Transaction,
}

impl TransactionGossip {
    /// Wrap `transaction` as sent by `from`.
    pub fn new(from: impl Into<String>, transaction: Transaction) -> Self {
        Self {
            from: from.into(),
            transaction,
        }
    }

    /// Unwrap the carried transaction.
    pub fn into_transaction(self) -> Transaction {
        self.transaction
    }
}

impl NetworkMessage for TransactionGossip {
    fn command() -> Command {
        Command::Tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokoin_types::test_utils::test_reward;

    #[test]
    fn test_transaction_gossip_into_transaction() {
        let tx = test_reward("alice", 1);
        let id = tx.id;
        let gossip = TransactionGossip::new("localhost:3001", tx);
        assert_eq!(gossip.from, "localhost:3001");
        assert_eq!(gossip.into_transaction().id, id);
    }
}
