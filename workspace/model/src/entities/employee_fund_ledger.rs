use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::account;

/// One fund row per (employee, admin) pair, drawn from the admin's
/// budget. `amount_spent` counts approved expenses only.
///
/// Invariant: `remaining_balance = amount_allocated - amount_spent`
/// and `remaining_balance >= 0`. The (employee_id, admin_id) pair is
/// unique; an employee holds at most one fund per supervising admin.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "employee_fund_ledger")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub employee_id: i32,
    pub admin_id: i32,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount_allocated: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount_spent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub remaining_balance: Decimal,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
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
