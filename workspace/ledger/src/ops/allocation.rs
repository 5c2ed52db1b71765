use chrono::Utc;
use model::entities::{
    account::{self, Role},
    budget_ledger, employee_fund_ledger,
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use tracing::{info, instrument};

use super::{ensure_positive, lock_budget_row, lock_fund_row};
use crate::actor::Actor;
use crate::error::{LedgerError, Result};

/// Request to move money from the company pool into an admin's budget.
#[derive(Debug, Clone)]
pub struct AllocateBudget {
    pub admin_id: i32,
    pub amount: Decimal,
    pub site_name: String,
    pub description: Option<String>,
}

/// Request to move money from an admin's budget into an employee fund.
#[derive(Debug, Clone)]
pub struct AllocateFund {
    pub employee_id: i32,
    pub amount: Decimal,
    pub site_name: String,
    pub description: Option<String>,
}

/// Superadmin-to-admin allocation. Creates the budget row on first
/// allocation, tops it up afterwards, and logs one allocation
/// transaction.
#[instrument(skip(db, actor, req), fields(admin_id = req.admin_id, amount = %req.amount))]
pub async fn allocate_budget(
    db: &DatabaseConnection,
    actor: &Actor,
    req: AllocateBudget,
) -> Result<budget_ledger::Model> {
    let superadmin = actor.require_superadmin()?;
    ensure_positive(req.amount)?;

    let txn = db.begin().await?;

    let admin = account::Entity::find_by_id(req.admin_id)
        .one(&txn)
        .await?
        .filter(|a| a.role == Role::Admin && a.is_active)
        .ok_or_else(|| LedgerError::NotFound(format!("active admin {}", req.admin_id)))?;

    let now = Utc::now();
    let budget = match lock_budget_row(&txn, admin.id).await? {
        Some(row) => {
            let mut active: budget_ledger::ActiveModel = row.clone().into();
            active.total_budget = Set(row.total_budget + req.amount);
            active.remaining = Set(row.remaining + req.amount);
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => {
            budget_ledger::ActiveModel {
                admin_id: Set(admin.id),
                total_budget: Set(req.amount),
                total_spent: Set(Decimal::ZERO),
                remaining: Set(req.amount),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };

    let description = req
        .description
        .unwrap_or_else(|| format!("Budget allocation to {}", admin.name));
    transaction::ActiveModel {
        sender_id: Set(Some(superadmin.id)),
        receiver_id: Set(Some(admin.id)),
        expense_id: Set(None),
        kind: Set(TransactionKind::Allocation),
        amount: Set(req.amount),
        description: Set(description),
        site_name: Set(Some(req.site_name.clone())),
        timestamp: Set(now),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(
        "Allocated {} to admin {} for site '{}'",
        req.amount, admin.id, req.site_name
    );
    Ok(budget)
}

/// Admin-to-employee allocation: the cross-ledger transfer. The amount
/// leaves the admin's `remaining` and enters the employee fund's
/// `remaining_balance`, so their sum is unchanged by this operation.
#[instrument(skip(db, actor, req), fields(employee_id = req.employee_id, amount = %req.amount))]
pub async fn allocate_fund(
    db: &DatabaseConnection,
    actor: &Actor,
    req: AllocateFund,
) -> Result<employee_fund_ledger::Model> {
    let admin = actor.require_admin()?;
    ensure_positive(req.amount)?;

    let txn = db.begin().await?;

    let employee = account::Entity::find_by_id(req.employee_id)
        .one(&txn)
        .await?
        .filter(|a| a.role == Role::Employee && a.is_active)
        .ok_or_else(|| LedgerError::NotFound(format!("active employee {}", req.employee_id)))?;
    if employee.supervisor_id != Some(admin.id) {
        return Err(LedgerError::Unauthorized(format!(
            "employee {} is not supervised by admin {}",
            employee.id, admin.id
        )));
    }

    // Budget row is locked before the fund row; every operation that
    // touches both takes them in this order.
    let Some(budget) = lock_budget_row(&txn, admin.id).await? else {
        return Err(LedgerError::InsufficientFunds {
            available: Decimal::ZERO,
            requested: req.amount,
        });
    };
    if budget.remaining < req.amount {
        return Err(LedgerError::InsufficientFunds {
            available: budget.remaining,
            requested: req.amount,
        });
    }

    let now = Utc::now();
    let mut budget_active: budget_ledger::ActiveModel = budget.clone().into();
    budget_active.total_spent = Set(budget.total_spent + req.amount);
    budget_active.remaining = Set(budget.remaining - req.amount);
    budget_active.updated_at = Set(now);
    budget_active.update(&txn).await?;

    let fund = match lock_fund_row(&txn, employee.id, admin.id).await? {
        Some(row) => {
            let mut active: employee_fund_ledger::ActiveModel = row.clone().into();
            active.amount_allocated = Set(row.amount_allocated + req.amount);
            active.remaining_balance = Set(row.remaining_balance + req.amount);
            active.updated_at = Set(now);
            active.update(&txn).await?
        }
        None => {
            employee_fund_ledger::ActiveModel {
                employee_id: Set(employee.id),
                admin_id: Set(admin.id),
                amount_allocated: Set(req.amount),
                amount_spent: Set(Decimal::ZERO),
                remaining_balance: Set(req.amount),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?
        }
    };

    let description = req
        .description
        .unwrap_or_else(|| format!("Fund allocation to {}", employee.name));
    transaction::ActiveModel {
        sender_id: Set(Some(admin.id)),
        receiver_id: Set(Some(employee.id)),
        expense_id: Set(None),
        kind: Set(TransactionKind::Allocation),
        amount: Set(req.amount),
        description: Set(description),
        site_name: Set(Some(req.site_name.clone())),
        timestamp: Set(now),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!(
        "Allocated {} from admin {} to employee {} for site '{}'",
        req.amount, admin.id, employee.id, req.site_name
    );
    Ok(fund)
}
