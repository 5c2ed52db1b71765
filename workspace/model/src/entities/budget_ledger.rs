use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::account;

/// One aggregate budget row per admin. `total_spent` counts money the
/// admin has pushed down to employee funds, not approved expenses.
///
/// Invariant, enforced by the ledger operations that are the only
/// writers of this table: `remaining = total_budget - total_spent` and
/// `remaining >= 0`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "budget_ledger")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub admin_id: i32,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_budget: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub total_spent: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub remaining: Decimal,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::AdminId",
        to = "account::Column::Id",
        on_delete = "Cascade"
    )]
    Admin,
}

impl Related<account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Admin.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
