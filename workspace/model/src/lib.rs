//! Persistence layer of the expense ledger: SeaORM entities for the
//! account directory, budget and employee fund ledgers, expense
//! claims, and the transaction log.

pub mod entities;
