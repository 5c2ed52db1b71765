use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::account;

/// Workflow status of an expense claim. `Approved` and `Rejected` are
/// terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ExpenseStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl ExpenseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseStatus::Pending => "pending",
            ExpenseStatus::Approved => "approved",
            ExpenseStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ExpenseStatus::Pending)
    }
}

/// An employee's claim against their fund. `admin_id` is resolved from
/// the employee's supervising admin at submission time and binds the
/// claim to exactly one fund row for its lifetime.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub employee_id: i32,
    pub admin_id: i32,
    pub title: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub status: ExpenseStatus,
    /// Receipt reference owned by the document storage collaborator.
    pub document_path: Option<String>,
    pub site_name: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub approved_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::EmployeeId",
        to = "account::Column::Id",
        on_delete = "Cascade"
    )]
    Employee,
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::AdminId",
        to = "account::Column::Id",
        on_delete = "Cascade"
    )]
    Admin,
}

impl ActiveModelBehavior for ActiveModel {}
