use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A single divergence between a stored balance column and the value
/// recomputed from the transaction log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct LedgerDrift {
    /// "budget_ledger" or "employee_fund_ledger".
    pub ledger: String,
    /// The admin whose ledger drifted.
    pub admin_id: i32,
    /// Set for employee fund drifts.
    pub employee_id: Option<i32>,
    /// The drifted column name.
    pub column: String,
    /// Value currently stored in the ledger row.
    pub stored: Decimal,
    /// Value derived from the transaction log.
    pub derived: Decimal,
}

impl LedgerDrift {
    /// Stored minus derived. Positive means the cached column claims
    /// more money than the log supports.
    pub fn delta(&self) -> Decimal {
        self.stored - self.derived
    }
}

/// Result of checking the denormalized balances against the
/// transaction log. An empty `drifts` list means the ledgers reconcile.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReconciliationReport {
    /// When the check ran.
    pub checked_at: DateTime<Utc>,
    /// Number of budget ledger rows examined.
    pub budgets_checked: usize,
    /// Number of employee fund rows examined.
    pub funds_checked: usize,
    /// Every divergence found.
    pub drifts: Vec<LedgerDrift>,
}

impl ReconciliationReport {
    pub fn is_clean(&self) -> bool {
        self.drifts.is_empty()
    }
}
