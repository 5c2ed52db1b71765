//! Transport-layer types shared between the ledger engine and the API.
//! These structs mirror the shapes the handlers serialize so reporting
//! consumers do not have to depend on SeaORM entities directly.

pub mod filters;
pub mod reconciliation;
pub mod summaries;

pub use filters::{DateRange, ExpenseFilter, TransactionFilter};
pub use reconciliation::{LedgerDrift, ReconciliationReport};
pub use summaries::{BudgetSummary, FundSummary, OverviewCounts};
