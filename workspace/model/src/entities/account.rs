use sea_orm::entity::prelude::*;

/// The role an account holds. Closed set; an account's role is fixed
/// at provisioning time and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Role {
    #[sea_orm(string_value = "superadmin")]
    Superadmin,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "employee")]
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

/// A user of the system: superadmin, admin, or employee.
///
/// `supervisor_id` is the authoritative management relation: an
/// employee's supervisor is the admin who allocates their fund and
/// reviews their expenses. `created_by` only records who provisioned
/// the account and is never consulted for authorization.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: Option<String>,
    /// Hash produced by the authentication collaborator; opaque here.
    pub password_hash: String,
    pub role: Role,
    /// The admin managing this employee. None for admins and superadmins.
    pub supervisor_id: Option<i32>,
    /// Provisioning audit trail.
    pub created_by: Option<i32>,
    #[sea_orm(default_value = "true")]
    pub is_active: bool,
    pub last_login_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The admin supervising this employee.
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::SupervisorId",
        to = "Column::Id"
    )]
    Supervisor,
    #[sea_orm(has_many = "super::budget_ledger::Entity")]
    BudgetLedger,
}

impl Related<super::budget_ledger::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetLedger.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
