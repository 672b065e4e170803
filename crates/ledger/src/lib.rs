//! Block storage for a Tokoin validator.
//!
//! [`MemoryLedger`] implements the core [`Ledger`](tokoin_core::Ledger)
//! trait: an append-only chain starting at the shared genesis block plus a
//! [`UtxoIndex`] of spendable outputs derived from it. The index is
//! recomputed from the whole chain on demand.

mod memory;
mod utxo;

pub use memory::MemoryLedger;
pub use tokoin_core::LedgerError;
pub use utxo::UtxoIndex;
