//! The fund-ledger consistency engine.
//!
//! This crate is the only code path allowed to mutate the budget
//! ledger, the employee fund ledgers, or an expense's workflow status,
//! and the only writer of the transaction log. Every operation in
//! [`ops`] runs inside a single database transaction: preconditions
//! are checked against row-locked balances before any mutation, and
//! the ledger updates commit together with exactly one new transaction
//! log row or not at all.
//!
//! Everything else in the workspace (reporting, exports, dashboards)
//! consumes the ledger read-only through [`query`].

pub mod actor;
pub mod directory;
pub mod error;
pub mod ops;
pub mod query;
pub mod reconcile;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use actor::Actor;
pub use error::{LedgerError, Result};
