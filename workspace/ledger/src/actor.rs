use model::entities::account::{self, Role};

use crate::error::{LedgerError, Result};

/// An authenticated caller, tagged by role.
///
/// Operations take the variant they require instead of comparing role
/// strings; an `Actor` can only be built from an active account, so
/// holding one is proof of an authenticated, active caller.
#[derive(Debug, Clone)]
pub enum Actor {
    Superadmin(account::Model),
    Admin(account::Model),
    Employee(account::Model),
}

impl Actor {
    /// Wraps an account row. Refuses deactivated accounts.
    pub fn from_account(account: account::Model) -> Result<Self> {
        if !account.is_active {
            return Err(LedgerError::Unauthorized(format!(
                "account {} is deactivated",
                account.id
            )));
        }
        Ok(match account.role {
            Role::Superadmin => Actor::Superadmin(account),
            Role::Admin => Actor::Admin(account),
            Role::Employee => Actor::Employee(account),
        })
    }

    pub fn account(&self) -> &account::Model {
        match self {
            Actor::Superadmin(a) | Actor::Admin(a) | Actor::Employee(a) => a,
        }
    }

    pub fn id(&self) -> i32 {
        self.account().id
    }

    pub fn role(&self) -> Role {
        self.account().role
    }

    pub fn require_superadmin(&self) -> Result<&account::Model> {
        match self {
            Actor::Superadmin(a) => Ok(a),
            _ => Err(LedgerError::Unauthorized(
                "superadmin role required".to_string(),
            )),
        }
    }

    pub fn require_admin(&self) -> Result<&account::Model> {
        match self {
            Actor::Admin(a) => Ok(a),
            _ => Err(LedgerError::Unauthorized("admin role required".to_string())),
        }
    }

    pub fn require_employee(&self) -> Result<&account::Model> {
        match self {
            Actor::Employee(a) => Ok(a),
            _ => Err(LedgerError::Unauthorized(
                "employee role required".to_string(),
            )),
        }
    }
}
