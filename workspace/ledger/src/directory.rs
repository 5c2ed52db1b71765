//! Account provisioning and lifecycle.
//!
//! Accounts are created with an immutable role. Creating an admin
//! seeds their zeroed budget row and creating an employee seeds the
//! zeroed fund row under their supervisor, so every later ledger
//! operation finds its rows in place.

use chrono::{DateTime, Utc};
use model::entities::{
    account::{self, Role},
    budget_ledger, employee_fund_ledger,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use tracing::{info, instrument};

use crate::actor::Actor;
use crate::error::{LedgerError, Result};

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    /// Required for employees, ignored for everyone else.
    pub supervisor_id: Option<i32>,
}

/// Mutable profile fields. Role and supervisor are deliberately
/// absent: both are fixed at provisioning time.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub password_hash: Option<String>,
}

/// Creates an account and its zeroed ledger rows in one transaction.
///
/// Superadmins may create any role; admins may only create employees
/// supervised by themselves.
#[instrument(skip(db, actor, req), fields(creator_id = actor.id(), email = %req.email))]
pub async fn provision_account(
    db: &DatabaseConnection,
    actor: &Actor,
    req: NewAccount,
) -> Result<account::Model> {
    let creator = match (actor, req.role) {
        (Actor::Superadmin(a), _) => a,
        (Actor::Admin(a), Role::Employee) => {
            match req.supervisor_id {
                Some(id) if id == a.id => {}
                _ => {
                    return Err(LedgerError::Unauthorized(
                        "admins may only create employees they supervise".to_string(),
                    ));
                }
            }
            a
        }
        _ => {
            return Err(LedgerError::Unauthorized(format!(
                "{} accounts cannot create {} accounts",
                actor.role().as_str(),
                req.role.as_str()
            )));
        }
    };

    let txn = db.begin().await?;

    if account::Entity::find()
        .filter(account::Column::Email.eq(req.email.clone()))
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(LedgerError::AlreadyExists(format!(
            "account with email {}",
            req.email
        )));
    }

    let now = Utc::now();
    let creator_id = creator.id;
    let created = match req.role {
        Role::Superadmin => insert_account_row(&txn, &req, None, creator_id, now).await?,
        Role::Admin => {
            let created = insert_account_row(&txn, &req, None, creator_id, now).await?;
            budget_ledger::ActiveModel {
                admin_id: Set(created.id),
                total_budget: Set(Decimal::ZERO),
                total_spent: Set(Decimal::ZERO),
                remaining: Set(Decimal::ZERO),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            created
        }
        Role::Employee => {
            let id = req
                .supervisor_id
                .ok_or_else(|| LedgerError::NotFound("supervising admin".to_string()))?;
            let supervisor = account::Entity::find_by_id(id)
                .filter(account::Column::Role.eq(Role::Admin))
                .filter(account::Column::IsActive.eq(true))
                .one(&txn)
                .await?
                .ok_or_else(|| LedgerError::NotFound(format!("supervising admin {id}")))?;

            let created =
                insert_account_row(&txn, &req, Some(supervisor.id), creator_id, now).await?;
            employee_fund_ledger::ActiveModel {
                employee_id: Set(created.id),
                admin_id: Set(supervisor.id),
                amount_allocated: Set(Decimal::ZERO),
                amount_spent: Set(Decimal::ZERO),
                remaining_balance: Set(Decimal::ZERO),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            created
        }
    };

    txn.commit().await?;
    info!(
        "Provisioned {} account {} ({})",
        created.role.as_str(),
        created.id,
        created.email
    );
    Ok(created)
}

async fn insert_account_row(
    txn: &DatabaseTransaction,
    req: &NewAccount,
    supervisor_id: Option<i32>,
    created_by: i32,
    now: DateTime<Utc>,
) -> Result<account::Model> {
    Ok(account::ActiveModel {
        name: Set(req.name.clone()),
        email: Set(req.email.clone()),
        phone: Set(req.phone.clone()),
        password_hash: Set(req.password_hash.clone()),
        role: Set(req.role),
        supervisor_id: Set(supervisor_id),
        created_by: Set(Some(created_by)),
        is_active: Set(true),
        last_login_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(txn)
    .await?)
}

/// Applies profile changes to an account. Superadmins may update
/// anyone, admins their supervised employees, and every account
/// itself.
#[instrument(skip(db, actor, update), fields(actor_id = actor.id(), account_id))]
pub async fn update_account(
    db: &DatabaseConnection,
    actor: &Actor,
    account_id: i32,
    update: AccountUpdate,
) -> Result<account::Model> {
    let target = account::Entity::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("account {account_id}")))?;

    let permitted = match actor {
        Actor::Superadmin(_) => true,
        Actor::Admin(a) => a.id == target.id || target.supervisor_id == Some(a.id),
        Actor::Employee(e) => e.id == target.id,
    };
    if !permitted {
        return Err(LedgerError::Unauthorized(format!(
            "account {} may not modify account {}",
            actor.id(),
            target.id
        )));
    }

    if let Some(email) = &update.email {
        if *email != target.email
            && account::Entity::find()
                .filter(account::Column::Email.eq(email.clone()))
                .one(db)
                .await?
                .is_some()
        {
            return Err(LedgerError::AlreadyExists(format!(
                "account with email {email}"
            )));
        }
    }

    let mut active: account::ActiveModel = target.into();
    if let Some(name) = update.name {
        active.name = Set(name);
    }
    if let Some(email) = update.email {
        active.email = Set(email);
    }
    if let Some(phone) = update.phone {
        active.phone = Set(phone);
    }
    if let Some(hash) = update.password_hash {
        active.password_hash = Set(hash);
    }
    active.updated_at = Set(Utc::now());

    Ok(active.update(db).await?)
}

/// Activates or deactivates an account. Superadmin only, and a
/// superadmin cannot deactivate themselves.
#[instrument(skip(db, actor), fields(actor_id = actor.id()))]
pub async fn set_active(
    db: &DatabaseConnection,
    actor: &Actor,
    account_id: i32,
    active: bool,
) -> Result<account::Model> {
    let caller = actor.require_superadmin()?;
    if caller.id == account_id && !active {
        return Err(LedgerError::Unauthorized(
            "superadmins cannot deactivate themselves".to_string(),
        ));
    }

    let target = account::Entity::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or_else(|| LedgerError::NotFound(format!("account {account_id}")))?;

    let mut model: account::ActiveModel = target.into();
    model.is_active = Set(active);
    model.updated_at = Set(Utc::now());
    let updated = model.update(db).await?;

    info!(
        "Account {} set {}",
        updated.id,
        if active { "active" } else { "inactive" }
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{seed_org, setup_db};
    use model::entities::prelude::*;

    fn new_account(role: Role, supervisor_id: Option<i32>) -> NewAccount {
        NewAccount {
            name: "Carol".to_string(),
            email: "carol@example.com".to_string(),
            phone: None,
            password_hash: "hash".to_string(),
            role,
            supervisor_id,
        }
    }

    #[tokio::test]
    async fn superadmin_provisions_admin_with_zero_budget() {
        let db = setup_db().await;
        let org = seed_org(&db).await;

        let created = provision_account(&db, &org.superadmin, new_account(Role::Admin, None))
            .await
            .unwrap();
        assert_eq!(created.role, Role::Admin);
        assert_eq!(created.created_by, Some(org.superadmin.id()));

        let budget = BudgetLedger::find()
            .filter(budget_ledger::Column::AdminId.eq(created.id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(budget.total_budget, Decimal::ZERO);
        assert_eq!(budget.remaining, Decimal::ZERO);
    }

    #[tokio::test]
    async fn admin_provisions_own_employee_with_zero_fund() {
        let db = setup_db().await;
        let org = seed_org(&db).await;

        let created = provision_account(
            &db,
            &org.admin,
            new_account(Role::Employee, Some(org.admin.id())),
        )
        .await
        .unwrap();
        assert_eq!(created.supervisor_id, Some(org.admin.id()));

        let fund = EmployeeFundLedger::find()
            .filter(employee_fund_ledger::Column::EmployeeId.eq(created.id))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fund.admin_id, org.admin.id());
        assert_eq!(fund.remaining_balance, Decimal::ZERO);
    }

    #[tokio::test]
    async fn admin_cannot_provision_admins_or_foreign_employees() {
        let db = setup_db().await;
        let org = seed_org(&db).await;

        let result = provision_account(&db, &org.admin, new_account(Role::Admin, None)).await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));

        let other = provision_account(&db, &org.superadmin, {
            let mut a = new_account(Role::Admin, None);
            a.email = "dave@example.com".to_string();
            a
        })
        .await
        .unwrap();

        let result = provision_account(
            &db,
            &org.admin,
            new_account(Role::Employee, Some(other.id)),
        )
        .await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn employee_cannot_provision_anyone() {
        let db = setup_db().await;
        let org = seed_org(&db).await;

        let result = provision_account(
            &db,
            &org.employee,
            new_account(Role::Employee, Some(org.admin.id())),
        )
        .await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let db = setup_db().await;
        let org = seed_org(&db).await;

        let mut req = new_account(Role::Admin, None);
        req.email = "alice@example.com".to_string();
        let result = provision_account(&db, &org.superadmin, req).await;
        assert!(matches!(result, Err(LedgerError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn employee_requires_an_active_admin_supervisor() {
        let db = setup_db().await;
        let org = seed_org(&db).await;

        let result = provision_account(&db, &org.superadmin, new_account(Role::Employee, None)).await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));

        let result = provision_account(
            &db,
            &org.superadmin,
            new_account(Role::Employee, Some(org.employee.id())),
        )
        .await;
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[tokio::test]
    async fn profile_updates_respect_ownership() {
        let db = setup_db().await;
        let org = seed_org(&db).await;

        let updated = update_account(
            &db,
            &org.employee,
            org.employee.id(),
            AccountUpdate {
                name: Some("Robert".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Robert");

        // Employees cannot touch their admin.
        let result = update_account(
            &db,
            &org.employee,
            org.admin.id(),
            AccountUpdate {
                name: Some("Eve".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));

        // Changing email to one already taken fails.
        let result = update_account(
            &db,
            &org.superadmin,
            org.employee.id(),
            AccountUpdate {
                email: Some("alice@example.com".to_string()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result, Err(LedgerError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn deactivation_is_superadmin_only_and_never_self() {
        let db = setup_db().await;
        let org = seed_org(&db).await;

        let result = set_active(&db, &org.admin, org.employee.id(), false).await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));

        let result = set_active(&db, &org.superadmin, org.superadmin.id(), false).await;
        assert!(matches!(result, Err(LedgerError::Unauthorized(_))));

        let updated = set_active(&db, &org.superadmin, org.admin.id(), false)
            .await
            .unwrap();
        assert!(!updated.is_active);

        // Deactivated accounts can no longer act.
        let stale = Account::find_by_id(org.admin.id())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(Actor::from_account(stale).is_err());
    }
}
