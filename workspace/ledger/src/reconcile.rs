//! Consistency checking between the denormalized ledger balances and
//! the append-only transaction log.
//!
//! The log is the source of truth. For every budget row the lifetime
//! totals are recomputed from allocation entries, for every fund row
//! from allocation and expense entries, and any column that disagrees
//! with its stored value is reported as drift. Reconciliation never
//! repairs anything; it only reports.

use chrono::Utc;
use common::reconciliation::{LedgerDrift, ReconciliationReport};
use model::entities::{
    budget_ledger, employee_fund_ledger,
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::{error, info, instrument};

use crate::error::Result;

async fn sum_amounts<F>(
    db: &DatabaseConnection,
    kind: TransactionKind,
    apply: F,
) -> Result<Decimal>
where
    F: FnOnce(sea_orm::Select<transaction::Entity>) -> sea_orm::Select<transaction::Entity>,
{
    let rows = apply(transaction::Entity::find().filter(transaction::Column::Kind.eq(kind)))
        .all(db)
        .await?;
    Ok(rows.iter().fold(Decimal::ZERO, |acc, t| acc + t.amount))
}

fn drift(
    ledger: &str,
    admin_id: i32,
    employee_id: Option<i32>,
    column: &str,
    stored: Decimal,
    derived: Decimal,
) -> Option<LedgerDrift> {
    if stored == derived {
        return None;
    }
    Some(LedgerDrift {
        ledger: ledger.to_string(),
        admin_id,
        employee_id,
        column: column.to_string(),
        stored,
        derived,
    })
}

/// Checks one admin's budget row. Budget received is the sum of
/// allocations into the admin, budget spent the sum of allocations
/// out of them.
async fn check_budget(
    db: &DatabaseConnection,
    row: &budget_ledger::Model,
) -> Result<Vec<LedgerDrift>> {
    let received = sum_amounts(db, TransactionKind::Allocation, |q| {
        q.filter(transaction::Column::ReceiverId.eq(row.admin_id))
    })
    .await?;
    let sent = sum_amounts(db, TransactionKind::Allocation, |q| {
        q.filter(transaction::Column::SenderId.eq(row.admin_id))
    })
    .await?;

    Ok([
        drift(
            "budget_ledger",
            row.admin_id,
            None,
            "total_budget",
            row.total_budget,
            received,
        ),
        drift(
            "budget_ledger",
            row.admin_id,
            None,
            "total_spent",
            row.total_spent,
            sent,
        ),
        drift(
            "budget_ledger",
            row.admin_id,
            None,
            "remaining",
            row.remaining,
            received - sent,
        ),
    ]
    .into_iter()
    .flatten()
    .collect())
}

/// Checks one employee fund row against allocations received from its
/// admin and approved expense entries sent back.
async fn check_fund(
    db: &DatabaseConnection,
    row: &employee_fund_ledger::Model,
) -> Result<Vec<LedgerDrift>> {
    let allocated = sum_amounts(db, TransactionKind::Allocation, |q| {
        q.filter(transaction::Column::SenderId.eq(row.admin_id))
            .filter(transaction::Column::ReceiverId.eq(row.employee_id))
    })
    .await?;
    let spent = sum_amounts(db, TransactionKind::Expense, |q| {
        q.filter(transaction::Column::SenderId.eq(row.employee_id))
            .filter(transaction::Column::ReceiverId.eq(row.admin_id))
    })
    .await?;

    Ok([
        drift(
            "employee_fund_ledger",
            row.admin_id,
            Some(row.employee_id),
            "amount_allocated",
            row.amount_allocated,
            allocated,
        ),
        drift(
            "employee_fund_ledger",
            row.admin_id,
            Some(row.employee_id),
            "amount_spent",
            row.amount_spent,
            spent,
        ),
        drift(
            "employee_fund_ledger",
            row.admin_id,
            Some(row.employee_id),
            "remaining_balance",
            row.remaining_balance,
            allocated - spent,
        ),
    ]
    .into_iter()
    .flatten()
    .collect())
}

/// Recomputes every ledger row from the transaction log and reports
/// each divergence found.
#[instrument(skip(db))]
pub async fn reconcile_all(db: &DatabaseConnection) -> Result<ReconciliationReport> {
    let budgets = budget_ledger::Entity::find().all(db).await?;
    let funds = employee_fund_ledger::Entity::find().all(db).await?;

    let mut drifts = Vec::new();
    for row in &budgets {
        drifts.extend(check_budget(db, row).await?);
    }
    for row in &funds {
        drifts.extend(check_fund(db, row).await?);
    }

    for d in &drifts {
        error!(
            "Ledger drift: {} admin {} {:?} column {} stored {} derived {} (delta {})",
            d.ledger,
            d.admin_id,
            d.employee_id,
            d.column,
            d.stored,
            d.derived,
            d.delta()
        );
    }

    let report = ReconciliationReport {
        checked_at: Utc::now(),
        budgets_checked: budgets.len(),
        funds_checked: funds.len(),
        drifts,
    };
    if report.is_clean() {
        info!(
            "Reconciliation clean: {} budget rows, {} fund rows",
            report.budgets_checked, report.funds_checked
        );
    }
    Ok(report)
}
