//! The atomic ledger operations: allocate budget, allocate fund,
//! submit, approve, and reject expenses.
//!
//! Each operation validates every precondition against row-locked
//! state inside one database transaction, performs its mutations,
//! appends the matching transaction log row, and commits. A failed
//! precondition aborts before any mutation is issued. Rows are locked
//! in a fixed order (budget, then expense, then fund) so concurrent
//! operations cannot deadlock.

use model::entities::{budget_ledger, employee_fund_ledger};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, QuerySelect};

use crate::error::{LedgerError, Result};

mod allocation;
mod expense;

pub use allocation::{AllocateBudget, AllocateFund, allocate_budget, allocate_fund};
pub use expense::{NewExpense, approve_expense, reject_expense, submit_expense};

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount(amount));
    }
    Ok(())
}

/// Loads an admin's budget row under an exclusive row lock so the
/// read-check-write sequence cannot race a concurrent allocation. The
/// lock maps to SELECT ... FOR UPDATE where the backend supports it;
/// SQLite serializes write transactions instead.
async fn lock_budget_row(
    txn: &DatabaseTransaction,
    admin_id: i32,
) -> Result<Option<budget_ledger::Model>> {
    Ok(budget_ledger::Entity::find()
        .filter(budget_ledger::Column::AdminId.eq(admin_id))
        .lock_exclusive()
        .one(txn)
        .await?)
}

/// Same locking discipline for an employee fund row.
async fn lock_fund_row(
    txn: &DatabaseTransaction,
    employee_id: i32,
    admin_id: i32,
) -> Result<Option<employee_fund_ledger::Model>> {
    Ok(employee_fund_ledger::Entity::find()
        .filter(employee_fund_ledger::Column::EmployeeId.eq(employee_id))
        .filter(employee_fund_ledger::Column::AdminId.eq(admin_id))
        .lock_exclusive()
        .one(txn)
        .await?)
}
