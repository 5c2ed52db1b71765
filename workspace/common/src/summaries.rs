use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An admin's budget position as held in the budget ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BudgetSummary {
    pub admin_id: i32,
    /// Lifetime amount allocated by the superadmin.
    pub total_budget: Decimal,
    /// Amount pushed down to employees (not approved expenses).
    pub total_spent: Decimal,
    pub remaining: Decimal,
}

impl BudgetSummary {
    /// A zero-valued summary for an admin with no budget row yet.
    pub fn empty(admin_id: i32) -> Self {
        Self {
            admin_id,
            total_budget: Decimal::ZERO,
            total_spent: Decimal::ZERO,
            remaining: Decimal::ZERO,
        }
    }
}

/// An employee's fund position under one supervising admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FundSummary {
    pub employee_id: i32,
    pub admin_id: i32,
    pub amount_allocated: Decimal,
    /// Amount consumed through approved expenses.
    pub amount_spent: Decimal,
    pub remaining_balance: Decimal,
}

impl FundSummary {
    pub fn empty(employee_id: i32, admin_id: i32) -> Self {
        Self {
            employee_id,
            admin_id,
            amount_allocated: Decimal::ZERO,
            amount_spent: Decimal::ZERO,
            remaining_balance: Decimal::ZERO,
        }
    }
}

/// Headline counts for the role dashboards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OverviewCounts {
    pub admins: u64,
    pub employees: u64,
    pub pending_expenses: u64,
    pub total_budget_allocated: Decimal,
    pub total_funds_allocated: Decimal,
    pub total_approved_expenses: Decimal,
}
