use chrono::Utc;
use model::entities::{
    employee_fund_ledger,
    expense::{self, ExpenseStatus},
    transaction::{self, TransactionKind},
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QuerySelect, Set, TransactionTrait,
};
use tracing::{error, info, instrument};

use super::{ensure_positive, lock_fund_row};
use crate::actor::Actor;
use crate::error::{LedgerError, Result};
use crate::store::DocumentStore;

/// A claim as submitted by an employee. The reviewing admin is never
/// part of the request; it is resolved from the employee's supervisor
/// at submission time.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub site_name: Option<String>,
    /// Reference produced by the document storage collaborator.
    pub document_path: Option<String>,
}

/// Creates a pending expense bound to the employee's supervising
/// admin and that admin's fund row. No ledger balance moves and no
/// transaction is logged until the claim is approved.
#[instrument(skip(db, actor, req), fields(employee_id = actor.id(), amount = %req.amount))]
pub async fn submit_expense(
    db: &DatabaseConnection,
    actor: &Actor,
    req: NewExpense,
) -> Result<expense::Model> {
    let employee = actor.require_employee()?;
    ensure_positive(req.amount)?;

    let admin_id = employee
        .supervisor_id
        .ok_or_else(|| LedgerError::NotFound("supervising admin".to_string()))?;

    // The claim must bind to exactly one fund for its lifetime.
    employee_fund_ledger::Entity::find()
        .filter(employee_fund_ledger::Column::EmployeeId.eq(employee.id))
        .filter(employee_fund_ledger::Column::AdminId.eq(admin_id))
        .one(db)
        .await?
        .ok_or_else(|| LedgerError::NotFound("employee fund".to_string()))?;

    let now = Utc::now();
    let claim = expense::ActiveModel {
        employee_id: Set(employee.id),
        admin_id: Set(admin_id),
        title: Set(req.title.clone()),
        description: Set(req.description.clone()),
        amount: Set(req.amount),
        status: Set(ExpenseStatus::Pending),
        document_path: Set(req.document_path.clone()),
        site_name: Set(req.site_name.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        approved_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        "Employee {} submitted expense {} for {}",
        employee.id, claim.id, claim.amount
    );
    Ok(claim)
}

/// Loads the expense under an exclusive row lock and enforces the
/// checks approve and reject share: the claim exists, the caller is
/// its reviewing admin, and it is still pending. The lock keeps two
/// concurrent settlements from both observing the claim as pending.
async fn load_pending_expense(
    txn: &DatabaseTransaction,
    admin_id: i32,
    expense_id: i32,
) -> Result<expense::Model> {
    let claim = expense::Entity::find_by_id(expense_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("expense {expense_id}")))?;

    if claim.admin_id != admin_id {
        return Err(LedgerError::Unauthorized(format!(
            "expense {} is not reviewed by admin {}",
            claim.id, admin_id
        )));
    }
    if claim.status.is_terminal() {
        return Err(LedgerError::InvalidState {
            expense_id: claim.id,
            status: claim.status.as_str().to_string(),
        });
    }
    Ok(claim)
}

/// Approves a pending expense: the claim becomes terminal, the
/// employee fund is drawn down, and one expense transaction is logged.
#[instrument(skip(db, actor), fields(admin_id = actor.id()))]
pub async fn approve_expense(
    db: &DatabaseConnection,
    actor: &Actor,
    expense_id: i32,
) -> Result<expense::Model> {
    let admin = actor.require_admin()?;

    let txn = db.begin().await?;

    let claim = load_pending_expense(&txn, admin.id, expense_id).await?;

    let fund = lock_fund_row(&txn, claim.employee_id, admin.id)
        .await?
        .ok_or_else(|| LedgerError::NotFound("employee fund".to_string()))?;
    if fund.remaining_balance < claim.amount {
        return Err(LedgerError::InsufficientFunds {
            available: fund.remaining_balance,
            requested: claim.amount,
        });
    }

    let now = Utc::now();
    let mut claim_active: expense::ActiveModel = claim.clone().into();
    claim_active.status = Set(ExpenseStatus::Approved);
    claim_active.approved_at = Set(Some(now));
    claim_active.updated_at = Set(now);
    let claim = claim_active.update(&txn).await?;

    let mut fund_active: employee_fund_ledger::ActiveModel = fund.clone().into();
    fund_active.amount_spent = Set(fund.amount_spent + claim.amount);
    fund_active.remaining_balance = Set(fund.remaining_balance - claim.amount);
    fund_active.updated_at = Set(now);
    fund_active.update(&txn).await?;

    transaction::ActiveModel {
        sender_id: Set(Some(claim.employee_id)),
        receiver_id: Set(Some(admin.id)),
        expense_id: Set(Some(claim.id)),
        kind: Set(TransactionKind::Expense),
        amount: Set(claim.amount),
        description: Set(claim.title.clone()),
        site_name: Set(claim.site_name.clone()),
        timestamp: Set(now),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;
    info!("Approved expense {} for {}", claim.id, claim.amount);
    Ok(claim)
}

/// Rejects a pending expense. No balance moves and nothing is logged;
/// once the rejection is committed, the claim's uploaded document is
/// released best-effort because no active claim references it anymore.
#[instrument(skip(db, actor, documents), fields(admin_id = actor.id()))]
pub async fn reject_expense(
    db: &DatabaseConnection,
    actor: &Actor,
    expense_id: i32,
    documents: &dyn DocumentStore,
) -> Result<expense::Model> {
    let admin = actor.require_admin()?;

    let txn = db.begin().await?;

    let claim = load_pending_expense(&txn, admin.id, expense_id).await?;

    let now = Utc::now();
    let mut claim_active: expense::ActiveModel = claim.clone().into();
    claim_active.status = Set(ExpenseStatus::Rejected);
    claim_active.updated_at = Set(now);
    let claim = claim_active.update(&txn).await?;

    txn.commit().await?;
    info!("Rejected expense {}", claim.id);

    // The ledger state is authoritative; a failed document cleanup is
    // logged and never unwinds the rejection.
    if let Some(path) = &claim.document_path {
        if let Err(e) = documents.delete(path).await {
            error!("Failed to delete document for expense {}: {}", claim.id, e);
        }
    }

    Ok(claim)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::ops::{AllocateBudget, AllocateFund, allocate_budget, allocate_fund};
    use crate::store::NoopDocumentStore;
    use crate::testing::{Org, dec, seed_org, setup_db};
    use async_trait::async_trait;
    use model::entities::prelude::*;

    /// Document store that records every delete it is asked for.
    #[derive(Default)]
    struct RecordingStore {
        deleted: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn delete(&self, path: &str) -> Result<()> {
            self.deleted.lock().unwrap().push(path.to_string());
            Ok(())
        }
    }

    async fn seed_funded_org(db: &sea_orm::DatabaseConnection, fund_cents: i64) -> Org {
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
                amount: dec(fund_cents),
                site_name: "North yard".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();
        org
    }

    fn claim_req(amount: Decimal) -> NewExpense {
        NewExpense {
            title: "Site materials".to_string(),
            description: None,
            amount,
            site_name: Some("North yard".to_string()),
            document_path: None,
        }
    }

    #[tokio::test]
    async fn submit_requires_employee_with_fund() {
        let db = setup_db().await;
        let org = seed_org(&db).await;

        let result = submit_expense(&db, &org.admin, claim_req(dec(100))).await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));

        // Supervised employee without a fund row cannot submit yet.
        let result = submit_expense(&db, &org.employee, claim_req(dec(100))).await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[tokio::test]
    async fn submit_rejects_non_positive_amounts() {
        let db = setup_db().await;
        let org = seed_funded_org(&db, 40_000).await;

        let result = submit_expense(&db, &org.employee, claim_req(Decimal::ZERO)).await;
        assert!(matches!(result, Err(LedgerError::InvalidAmount(_))));
    }

    #[tokio::test]
    async fn submit_binds_claim_to_supervising_admin() {
        let db = setup_db().await;
        let org = seed_funded_org(&db, 40_000).await;

        let claim = submit_expense(&db, &org.employee, claim_req(dec(25_000)))
            .await
            .unwrap();
        assert_eq!(claim.status, ExpenseStatus::Pending);
        assert_eq!(claim.admin_id, org.admin.id());
        assert_eq!(claim.employee_id, org.employee.id());
        assert!(claim.approved_at.is_none());

        // Submission logs nothing; only the two allocations are there.
        let log = Transaction::find().all(&db).await.unwrap();
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn approval_workflow_end_to_end() {
        // The full scenario: budget 1000.00, fund 400.00, claim
        // 250.00, approve, then try to approve again.
        let db = setup_db().await;
        let org = seed_funded_org(&db, 40_000).await;

        let claim = submit_expense(&db, &org.employee, claim_req(dec(25_000)))
            .await
            .unwrap();

        let approved = approve_expense(&db, &org.admin, claim.id).await.unwrap();
        assert_eq!(approved.status, ExpenseStatus::Approved);
        assert!(approved.approved_at.is_some());

        let fund = EmployeeFundLedger::find().one(&db).await.unwrap().unwrap();
        assert_eq!(fund.remaining_balance, dec(15_000));
        assert_eq!(fund.amount_spent, dec(25_000));

        let expense_log = Transaction::find()
            .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(expense_log.len(), 1);
        assert_eq!(expense_log[0].amount, dec(25_000));
        assert_eq!(expense_log[0].sender_id, Some(org.employee.id()));
        assert_eq!(expense_log[0].receiver_id, Some(org.admin.id()));
        assert_eq!(expense_log[0].expense_id, Some(claim.id));

        // Terminal states are final.
        let again = approve_expense(&db, &org.admin, claim.id).await;
        assert!(matches!(again, Err(LedgerError::InvalidState { .. })));
        let reject = reject_expense(&db, &org.admin, claim.id, &NoopDocumentStore).await;
        assert!(matches!(reject, Err(LedgerError::InvalidState { .. })));

        // Neither failed call moved money or logged anything.
        let fund = EmployeeFundLedger::find().one(&db).await.unwrap().unwrap();
        assert_eq!(fund.amount_spent, dec(25_000));
        assert_eq!(
            Transaction::find()
                .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
                .all(&db)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn approval_refuses_overdraft() {
        let db = setup_db().await;
        let org = seed_funded_org(&db, 20_000).await;

        let claim = submit_expense(&db, &org.employee, claim_req(dec(25_000)))
            .await
            .unwrap();

        let result = approve_expense(&db, &org.admin, claim.id).await;
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds { available, requested })
                if available == dec(20_000) && requested == dec(25_000)
        ));

        // The claim stays pending and the fund is untouched.
        let claim = Expense::find_by_id(claim.id).one(&db).await.unwrap().unwrap();
        assert_eq!(claim.status, ExpenseStatus::Pending);
        let fund = EmployeeFundLedger::find().one(&db).await.unwrap().unwrap();
        assert_eq!(fund.remaining_balance, dec(20_000));
        assert_eq!(fund.amount_spent, Decimal::ZERO);
    }

    fn spawn_approval(
        db: &sea_orm::DatabaseConnection,
        admin: &Actor,
        expense_id: i32,
    ) -> tokio::task::JoinHandle<Result<expense::Model>> {
        let db = db.clone();
        let admin = admin.clone();
        tokio::spawn(async move { approve_expense(&db, &admin, expense_id).await })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn racing_approvals_cannot_overdraw_a_shared_fund() {
        // Two claims worth 400.00 race against a 400.00 fund: exactly
        // one approval may land.
        let db = setup_db().await;
        let org = seed_funded_org(&db, 40_000).await;

        let first = submit_expense(&db, &org.employee, claim_req(dec(40_000)))
            .await
            .unwrap();
        let second = submit_expense(&db, &org.employee, claim_req(dec(40_000)))
            .await
            .unwrap();

        let a = spawn_approval(&db, &org.admin, first.id);
        let b = spawn_approval(&db, &org.admin, second.id);
        let results = [a.await.unwrap(), b.await.unwrap()];

        let successes = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(LedgerError::InsufficientFunds { .. })
        )));

        let fund = EmployeeFundLedger::find().one(&db).await.unwrap().unwrap();
        assert_eq!(fund.remaining_balance, Decimal::ZERO);
        assert_eq!(fund.amount_spent, dec(40_000));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn racing_approvals_on_one_claim_settle_it_once() {
        // Two reviewers approve the same claim at once; the fund is
        // debited exactly once and the log gains exactly one row.
        let db = setup_db().await;
        let org = seed_funded_org(&db, 40_000).await;
        let claim = submit_expense(&db, &org.employee, claim_req(dec(25_000)))
            .await
            .unwrap();

        let a = spawn_approval(&db, &org.admin, claim.id);
        let b = spawn_approval(&db, &org.admin, claim.id);
        let results = [a.await.unwrap(), b.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(LedgerError::InvalidState { .. })
        )));

        let fund = EmployeeFundLedger::find().one(&db).await.unwrap().unwrap();
        assert_eq!(fund.amount_spent, dec(25_000));
        assert_eq!(fund.remaining_balance, dec(15_000));
        let expense_log = Transaction::find()
            .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
            .all(&db)
            .await
            .unwrap();
        assert_eq!(expense_log.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn racing_approve_and_reject_agree_on_one_outcome() {
        // An approval and a rejection race for the same pending
        // claim; whichever loses sees a terminal status, and the fund
        // matches the winner.
        let db = setup_db().await;
        let org = seed_funded_org(&db, 40_000).await;
        let claim = submit_expense(&db, &org.employee, claim_req(dec(25_000)))
            .await
            .unwrap();

        let approval = spawn_approval(&db, &org.admin, claim.id);
        let rejection = tokio::spawn({
            let db = db.clone();
            let admin = org.admin.clone();
            async move { reject_expense(&db, &admin, claim.id, &NoopDocumentStore).await }
        });
        let approval = approval.await.unwrap();
        let rejection = rejection.await.unwrap();

        assert_ne!(approval.is_ok(), rejection.is_ok());
        let loser = if approval.is_ok() { &rejection } else { &approval };
        assert!(matches!(loser, Err(LedgerError::InvalidState { .. })));

        let settled = Expense::find_by_id(claim.id).one(&db).await.unwrap().unwrap();
        let fund = EmployeeFundLedger::find().one(&db).await.unwrap().unwrap();
        match settled.status {
            ExpenseStatus::Approved => {
                assert_eq!(fund.amount_spent, dec(25_000));
            }
            ExpenseStatus::Rejected => {
                assert_eq!(fund.amount_spent, Decimal::ZERO);
            }
            ExpenseStatus::Pending => panic!("claim was never settled"),
        }
    }

    #[tokio::test]
    async fn approval_requires_owning_admin() {
        let db = setup_db().await;
        let org = seed_funded_org(&db, 40_000).await;
        let outsider = crate::testing::insert_account(
            &db,
            "Mallory",
            "mallory@example.com",
            model::entities::account::Role::Admin,
            None,
        )
        .await;
        let outsider = Actor::from_account(outsider).unwrap();

        let claim = submit_expense(&db, &org.employee, claim_req(dec(10_000)))
            .await
            .unwrap();

        let result = approve_expense(&db, &outsider, claim.id).await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));
        let result = reject_expense(&db, &outsider, claim.id, &NoopDocumentStore).await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn approving_missing_expense_fails() {
        let db = setup_db().await;
        let org = seed_funded_org(&db, 40_000).await;

        let result = approve_expense(&db, &org.admin, 9999).await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[tokio::test]
    async fn rejection_releases_the_document_and_moves_no_money() {
        let db = setup_db().await;
        let org = seed_funded_org(&db, 40_000).await;

        let mut req = claim_req(dec(10_000));
        req.document_path = Some("receipt_123.pdf".to_string());
        let claim = submit_expense(&db, &org.employee, req).await.unwrap();

        let store = RecordingStore::default();
        let rejected = reject_expense(&db, &org.admin, claim.id, &store).await.unwrap();
        assert_eq!(rejected.status, ExpenseStatus::Rejected);
        assert!(rejected.approved_at.is_none());
        assert_eq!(
            store.deleted.lock().unwrap().as_slice(),
            &["receipt_123.pdf".to_string()]
        );

        // Fund untouched, no expense transaction logged.
        let fund = EmployeeFundLedger::find().one(&db).await.unwrap().unwrap();
        assert_eq!(fund.remaining_balance, dec(40_000));
        assert_eq!(fund.amount_spent, Decimal::ZERO);
        let expense_log = Transaction::find()
            .filter(transaction::Column::Kind.eq(TransactionKind::Expense))
            .all(&db)
            .await
            .unwrap();
        assert!(expense_log.is_empty());
    }
}
