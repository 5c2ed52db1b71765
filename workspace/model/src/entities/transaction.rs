use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

use super::{account, expense};

/// The kind of money movement a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum TransactionKind {
    /// Superadmin to admin, or admin to employee fund.
    #[sea_orm(string_value = "allocation")]
    Allocation,
    /// Approved expense drawing down an employee fund.
    #[sea_orm(string_value = "expense")]
    Expense,
    /// Money returned to the sender's side. No current operation emits
    /// this kind; it is part of the log's closed vocabulary.
    #[sea_orm(string_value = "refund")]
    Refund,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Allocation => "allocation",
            TransactionKind::Expense => "expense",
            TransactionKind::Refund => "refund",
        }
    }
}

/// Append-only audit record of a money movement. Rows are never
/// updated after insert, and the party/expense references are nullable
/// with SET NULL semantics so the trail survives account and expense
/// deletion.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub sender_id: Option<i32>,
    pub receiver_id: Option<i32>,
    /// Set for expense-kind entries.
    pub expense_id: Option<i32>,
    pub kind: TransactionKind,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub amount: Decimal,
    pub description: String,
    pub site_name: Option<String>,
    pub timestamp: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::SenderId",
        to = "account::Column::Id",
        on_delete = "SetNull"
    )]
    Sender,
    #[sea_orm(
        belongs_to = "account::Entity",
        from = "Column::ReceiverId",
        to = "account::Column::Id",
        on_delete = "SetNull"
    )]
    Receiver,
    #[sea_orm(
        belongs_to = "expense::Entity",
        from = "Column::ExpenseId",
        to = "expense::Column::Id",
        on_delete = "SetNull"
    )]
    Expense,
}

impl Related<expense::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expense.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
