//! Read-only views over accounts, ledgers, and the transaction log.
//!
//! Every query narrows its result set by the calling actor's role:
//! superadmins see everything, admins see their own budget and their
//! supervised employees, employees see only themselves. A filter can
//! restrict further but never widen past that boundary.

use chrono::{Duration, NaiveDate, NaiveTime};
use common::filters::{DateRange, ExpenseFilter, TransactionFilter};
use common::summaries::{BudgetSummary, FundSummary, OverviewCounts};
use model::entities::{
    account::{self, Role},
    budget_ledger, employee_fund_ledger,
    expense::{self, ExpenseStatus},
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Select,
};
use tracing::{debug, instrument, warn};

use crate::actor::Actor;
use crate::error::{LedgerError, Result};

fn parse_kind(raw: &str) -> Option<TransactionKind> {
    match raw {
        "allocation" => Some(TransactionKind::Allocation),
        "expense" => Some(TransactionKind::Expense),
        "refund" => Some(TransactionKind::Refund),
        _ => None,
    }
}

fn parse_status(raw: &str) -> Option<ExpenseStatus> {
    match raw {
        "pending" => Some(ExpenseStatus::Pending),
        "approved" => Some(ExpenseStatus::Approved),
        "rejected" => Some(ExpenseStatus::Rejected),
        _ => None,
    }
}

fn day_start(date: NaiveDate) -> chrono::DateTime<chrono::Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Bounds a timestamp column to an inclusive day range.
fn filter_date_range<E: EntityTrait>(
    mut query: Select<E>,
    column: impl ColumnTrait,
    range: &DateRange,
) -> Select<E> {
    if let Some(from) = range.from {
        query = query.filter(column.gte(day_start(from)));
    }
    if let Some(to) = range.to {
        query = query.filter(column.lt(day_start(to) + Duration::days(1)));
    }
    query
}

/// An admin's budget position. Admins read their own, superadmins
/// read anyone's. An admin without a budget row yet reads as zeroes.
#[instrument(skip(db, actor))]
pub async fn get_budget(
    db: &DatabaseConnection,
    actor: &Actor,
    admin_id: i32,
) -> Result<BudgetSummary> {
    match actor {
        Actor::Superadmin(_) => {}
        Actor::Admin(a) if a.id == admin_id => {}
        _ => {
            return Err(LedgerError::Unauthorized(format!(
                "account {} may not read admin {}'s budget",
                actor.id(),
                admin_id
            )));
        }
    }

    let row = budget_ledger::Entity::find()
        .filter(budget_ledger::Column::AdminId.eq(admin_id))
        .one(db)
        .await?;

    Ok(match row {
        Some(b) => BudgetSummary {
            admin_id: b.admin_id,
            total_budget: b.total_budget,
            total_spent: b.total_spent,
            remaining: b.remaining,
        },
        None => BudgetSummary::empty(admin_id),
    })
}

/// An employee's fund position under their supervising admin.
#[instrument(skip(db, actor))]
pub async fn get_employee_fund(
    db: &DatabaseConnection,
    actor: &Actor,
    employee_id: i32,
) -> Result<FundSummary> {
    let employee = account::Entity::find_by_id(employee_id)
        .filter(account::Column::Role.eq(Role::Employee))
        .one(db)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("employee {employee_id}")))?;

    match actor {
        Actor::Superadmin(_) => {}
        Actor::Admin(a) if employee.supervisor_id == Some(a.id) => {}
        Actor::Employee(e) if e.id == employee_id => {}
        _ => {
            return Err(LedgerError::Unauthorized(format!(
                "account {} may not read employee {}'s fund",
                actor.id(),
                employee_id
            )));
        }
    }

    let row = employee_fund_ledger::Entity::find()
        .filter(employee_fund_ledger::Column::EmployeeId.eq(employee_id))
        .one(db)
        .await?;

    Ok(match row {
        Some(f) => FundSummary {
            employee_id: f.employee_id,
            admin_id: f.admin_id,
            amount_allocated: f.amount_allocated,
            amount_spent: f.amount_spent,
            remaining_balance: f.remaining_balance,
        },
        None => FundSummary::empty(employee_id, employee.supervisor_id.unwrap_or_default()),
    })
}

/// Every fund row under one admin, for that admin or a superadmin.
#[instrument(skip(db, actor))]
pub async fn list_funds_for_admin(
    db: &DatabaseConnection,
    actor: &Actor,
    admin_id: i32,
) -> Result<Vec<FundSummary>> {
    match actor {
        Actor::Superadmin(_) => {}
        Actor::Admin(a) if a.id == admin_id => {}
        _ => {
            return Err(LedgerError::Unauthorized(format!(
                "account {} may not list admin {}'s funds",
                actor.id(),
                admin_id
            )));
        }
    }

    let rows = employee_fund_ledger::Entity::find()
        .filter(employee_fund_ledger::Column::AdminId.eq(admin_id))
        .order_by_asc(employee_fund_ledger::Column::EmployeeId)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|f| FundSummary {
            employee_id: f.employee_id,
            admin_id: f.admin_id,
            amount_allocated: f.amount_allocated,
            amount_spent: f.amount_spent,
            remaining_balance: f.remaining_balance,
        })
        .collect())
}

/// Transaction log entries visible to the actor, newest first.
///
/// Non-superadmins are pinned to entries they sent or received, on
/// top of whatever the filter asks for. An unknown `kind` string
/// matches nothing.
#[instrument(skip(db, actor, filter))]
pub async fn list_transactions(
    db: &DatabaseConnection,
    actor: &Actor,
    filter: &TransactionFilter,
) -> Result<Vec<transaction::Model>> {
    let mut query = transaction::Entity::find();

    if let Some(raw) = &filter.kind {
        let Some(kind) = parse_kind(raw) else {
            warn!("Unknown transaction kind filter: {raw}");
            return Ok(Vec::new());
        };
        query = query.filter(transaction::Column::Kind.eq(kind));
    }
    if let Some(id) = filter.sender_id {
        query = query.filter(transaction::Column::SenderId.eq(id));
    }
    if let Some(id) = filter.receiver_id {
        query = query.filter(transaction::Column::ReceiverId.eq(id));
    }
    if let Some(id) = filter.expense_id {
        query = query.filter(transaction::Column::ExpenseId.eq(id));
    }
    query = filter_date_range(query, transaction::Column::Timestamp, &filter.date_range());

    let party = match actor {
        Actor::Superadmin(_) => filter.party_id,
        _ => Some(actor.id()),
    };
    if let Some(id) = party {
        query = query.filter(
            Condition::any()
                .add(transaction::Column::SenderId.eq(id))
                .add(transaction::Column::ReceiverId.eq(id)),
        );
    }

    let rows = query
        .order_by_desc(transaction::Column::Timestamp)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await?;
    debug!("Listed {} transactions", rows.len());
    Ok(rows)
}

/// A single expense claim, for its employee, its reviewing admin, or
/// a superadmin.
#[instrument(skip(db, actor))]
pub async fn get_expense(
    db: &DatabaseConnection,
    actor: &Actor,
    expense_id: i32,
) -> Result<expense::Model> {
    let claim = expense::Entity::find_by_id(expense_id)
        .one(db)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("expense {expense_id}")))?;

    let visible = match actor {
        Actor::Superadmin(_) => true,
        Actor::Admin(a) => claim.admin_id == a.id,
        Actor::Employee(e) => claim.employee_id == e.id,
    };
    if !visible {
        // Invisible claims read as missing.
        return Err(LedgerError::NotFound(format!("expense {expense_id}")));
    }
    Ok(claim)
}

/// Expense claims visible to the actor, newest first. Admins are
/// pinned to claims they review, employees to their own claims.
#[instrument(skip(db, actor, filter))]
pub async fn list_expenses(
    db: &DatabaseConnection,
    actor: &Actor,
    filter: &ExpenseFilter,
) -> Result<Vec<expense::Model>> {
    let mut query = expense::Entity::find();

    match actor {
        Actor::Superadmin(_) => {
            if let Some(id) = filter.admin_id {
                query = query.filter(expense::Column::AdminId.eq(id));
            }
            if let Some(id) = filter.employee_id {
                query = query.filter(expense::Column::EmployeeId.eq(id));
            }
        }
        Actor::Admin(a) => {
            query = query.filter(expense::Column::AdminId.eq(a.id));
            if let Some(id) = filter.employee_id {
                query = query.filter(expense::Column::EmployeeId.eq(id));
            }
        }
        Actor::Employee(e) => {
            query = query.filter(expense::Column::EmployeeId.eq(e.id));
        }
    }

    if let Some(raw) = &filter.status {
        let Some(status) = parse_status(raw) else {
            warn!("Unknown expense status filter: {raw}");
            return Ok(Vec::new());
        };
        query = query.filter(expense::Column::Status.eq(status));
    }
    if let Some(site) = &filter.site_name {
        query = query.filter(expense::Column::SiteName.eq(site.clone()));
    }
    query = filter_date_range(query, expense::Column::CreatedAt, &filter.date_range());

    Ok(query
        .order_by_desc(expense::Column::CreatedAt)
        .order_by_desc(expense::Column::Id)
        .all(db)
        .await?)
}

/// Headline numbers for the superadmin dashboard. Decimal totals are
/// folded in Rust so no precision is lost to a SQL aggregate.
#[instrument(skip(db, actor))]
pub async fn overview(db: &DatabaseConnection, actor: &Actor) -> Result<OverviewCounts> {
    actor.require_superadmin()?;

    let admins = account::Entity::find()
        .filter(account::Column::Role.eq(Role::Admin))
        .filter(account::Column::IsActive.eq(true))
        .count(db)
        .await?;
    let employees = account::Entity::find()
        .filter(account::Column::Role.eq(Role::Employee))
        .filter(account::Column::IsActive.eq(true))
        .count(db)
        .await?;
    let pending_expenses = expense::Entity::find()
        .filter(expense::Column::Status.eq(ExpenseStatus::Pending))
        .count(db)
        .await?;

    let total_budget_allocated = budget_ledger::Entity::find()
        .all(db)
        .await?
        .iter()
        .fold(Decimal::ZERO, |acc, b| acc + b.total_budget);
    let total_funds_allocated = employee_fund_ledger::Entity::find()
        .all(db)
        .await?
        .iter()
        .fold(Decimal::ZERO, |acc, f| acc + f.amount_allocated);
    let total_approved_expenses = expense::Entity::find()
        .filter(expense::Column::Status.eq(ExpenseStatus::Approved))
        .all(db)
        .await?
        .iter()
        .fold(Decimal::ZERO, |acc, e| acc + e.amount);

    Ok(OverviewCounts {
        admins,
        employees,
        pending_expenses,
        total_budget_allocated,
        total_funds_allocated,
        total_approved_expenses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{
        AllocateBudget, AllocateFund, NewExpense, allocate_budget, allocate_fund, approve_expense,
        submit_expense,
    };
    use crate::testing::{Org, dec, seed_org, setup_db};

    async fn seed_activity(db: &DatabaseConnection) -> Org {
        let org = seed_org(db).await;
        allocate_budget(
            db,
            &org.superadmin,
            AllocateBudget {
                admin_id: org.admin.id(),
                amount: dec(100_000),
                site_name: "North yard".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        allocate_fund(
            db,
            &org.admin,
            AllocateFund {
                employee_id: org.employee.id(),
                amount: dec(40_000),
                site_name: "North yard".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        let claim = submit_expense(
            db,
            &org.employee,
            NewExpense {
                title: "Site materials".to_string(),
                description: None,
                amount: dec(25_000),
                site_name: Some("North yard".to_string()),
                document_path: None,
            },
        )
        .await
        .unwrap();
        approve_expense(db, &org.admin, claim.id).await.unwrap();
        org
    }

    #[tokio::test]
    async fn budget_and_fund_summaries() {
        let db = setup_db().await;
        let org = seed_activity(&db).await;

        let budget = get_budget(&db, &org.admin, org.admin.id()).await.unwrap();
        assert_eq!(budget.total_budget, dec(100_000));
        assert_eq!(budget.total_spent, dec(40_000));
        assert_eq!(budget.remaining, dec(60_000));

        let fund = get_employee_fund(&db, &org.employee, org.employee.id())
            .await
            .unwrap();
        assert_eq!(fund.amount_allocated, dec(40_000));
        assert_eq!(fund.amount_spent, dec(25_000));
        assert_eq!(fund.remaining_balance, dec(15_000));

        // Employees cannot read the admin's budget.
        let result = get_budget(&db, &org.employee, org.admin.id()).await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn missing_ledger_rows_read_as_zero() {
        let db = setup_db().await;
        let org = seed_org(&db).await;

        let budget = get_budget(&db, &org.admin, org.admin.id()).await.unwrap();
        assert_eq!(budget, BudgetSummary::empty(org.admin.id()));

        let fund = get_employee_fund(&db, &org.employee, org.employee.id())
            .await
            .unwrap();
        assert_eq!(fund, FundSummary::empty(org.employee.id(), org.admin.id()));
    }

    #[tokio::test]
    async fn transaction_log_is_scoped_and_filtered() {
        let db = setup_db().await;
        let org = seed_activity(&db).await;

        // Superadmin sees the whole log: two allocations, one expense.
        let all = list_transactions(&db, &org.superadmin, &TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        // The employee only sees entries they are a party to.
        let mine = list_transactions(&db, &org.employee, &TransactionFilter::default())
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine
            .iter()
            .all(|t| t.sender_id == Some(org.employee.id())
                || t.receiver_id == Some(org.employee.id())));

        let allocations = list_transactions(
            &db,
            &org.superadmin,
            &TransactionFilter {
                kind: Some("allocation".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(allocations.len(), 2);

        // Unknown kinds match nothing instead of erroring.
        let none = list_transactions(
            &db,
            &org.superadmin,
            &TransactionFilter {
                kind: Some("wire".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn date_range_bounds_the_log() {
        let db = setup_db().await;
        let org = seed_activity(&db).await;

        let all = list_transactions(&db, &org.superadmin, &TransactionFilter::default())
            .await
            .unwrap();
        let today = all[0].timestamp.date_naive();

        // A range covering today keeps every entry.
        let bounded = list_transactions(
            &db,
            &org.superadmin,
            &TransactionFilter {
                from: Some(today),
                to: Some(today),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(bounded.len(), all.len());

        // A range starting tomorrow keeps none.
        let none = list_transactions(
            &db,
            &org.superadmin,
            &TransactionFilter {
                from: Some(today + Duration::days(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn single_expense_visibility() {
        let db = setup_db().await;
        let org = seed_activity(&db).await;
        let claim_id = list_expenses(&db, &org.superadmin, &ExpenseFilter::default())
            .await
            .unwrap()[0]
            .id;

        assert!(get_expense(&db, &org.employee, claim_id).await.is_ok());
        assert!(get_expense(&db, &org.admin, claim_id).await.is_ok());

        let outsider = crate::testing::insert_account(
            &db,
            "Mallory",
            "mallory@example.com",
            model::entities::account::Role::Admin,
            None,
        )
        .await;
        let outsider = crate::actor::Actor::from_account(outsider).unwrap();
        let result = get_expense(&db, &outsider, claim_id).await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[tokio::test]
    async fn expense_listing_pins_to_role() {
        let db = setup_db().await;
        let org = seed_activity(&db).await;
        submit_expense(
            &db,
            &org.employee,
            NewExpense {
                title: "Fuel".to_string(),
                description: None,
                amount: dec(5_000),
                site_name: None,
                document_path: None,
            },
        )
        .await
        .unwrap();

        let all = list_expenses(&db, &org.admin, &ExpenseFilter::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let pending = list_expenses(
            &db,
            &org.admin,
            &ExpenseFilter {
                status: Some("pending".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].title, "Fuel");

        let none = list_expenses(
            &db,
            &org.admin,
            &ExpenseFilter {
                status: Some("shredded".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn overview_totals_are_exact() {
        let db = setup_db().await;
        let org = seed_activity(&db).await;

        let counts = overview(&db, &org.superadmin).await.unwrap();
        assert_eq!(counts.admins, 1);
        assert_eq!(counts.employees, 1);
        assert_eq!(counts.pending_expenses, 0);
        assert_eq!(counts.total_budget_allocated, dec(100_000));
        assert_eq!(counts.total_funds_allocated, dec(40_000));
        assert_eq!(counts.total_approved_expenses, dec(25_000));

        let result = overview(&db, &org.admin).await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));
    }
}
