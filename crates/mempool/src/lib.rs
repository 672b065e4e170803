//! Pending transaction pool.
//!
//! Transactions wait here between intake and commit. The pool keeps
//! insertion order so candidate blocks list transactions in the order
//! they arrived. All access is serialized through the node's event loop,
//! so plain collections are enough.

mod pool;

pub use pool::Mempool;
