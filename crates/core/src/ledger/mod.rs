//! Audit ledger.
//!
//! [`AuditLedger`] collects one [`ExecutionOutcome`] per processed unit during
//! a run. [`LedgerStore`] persists finished runs so reports survive the
//! process.

mod sqlite;
mod store;
mod types;

pub use sqlite::*;
pub use store::*;
pub use types::*;
