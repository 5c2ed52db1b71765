use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create accounts table
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(pk_auto(Accounts::Id))
                    .col(string(Accounts::Name))
                    .col(string(Accounts::Email).unique_key())
                    .col(string_null(Accounts::Phone))
                    .col(text(Accounts::PasswordHash))
                    .col(string_len(Accounts::Role, 20))
                    .col(integer_null(Accounts::SupervisorId))
                    .col(integer_null(Accounts::CreatedBy))
                    .col(boolean(Accounts::IsActive).default(true))
                    .col(timestamp_with_time_zone_null(Accounts::LastLoginAt))
                    .col(timestamp_with_time_zone(Accounts::CreatedAt))
                    .col(timestamp_with_time_zone(Accounts::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_supervisor")
                            .from(Accounts::Table, Accounts::SupervisorId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_account_creator")
                            .from(Accounts::Table, Accounts::CreatedBy)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_role")
                    .table(Accounts::Table)
                    .col(Accounts::Role)
                    .to_owned(),
            )
            .await?;

        // Create budget_ledger table (one row per admin)
        manager
            .create_table(
                Table::create()
                    .table(BudgetLedger::Table)
                    .if_not_exists()
                    .col(pk_auto(BudgetLedger::Id))
                    .col(integer_uniq(BudgetLedger::AdminId))
                    .col(decimal_len(BudgetLedger::TotalBudget, 15, 2).default("0.00"))
                    .col(decimal_len(BudgetLedger::TotalSpent, 15, 2).default("0.00"))
                    .col(decimal_len(BudgetLedger::Remaining, 15, 2).default("0.00"))
                    .col(timestamp_with_time_zone(BudgetLedger::CreatedAt))
                    .col(timestamp_with_time_zone(BudgetLedger::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_budget_ledger_admin")
                            .from(BudgetLedger::Table, BudgetLedger::AdminId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create employee_fund_ledger table (one row per (employee, admin) pair)
        manager
            .create_table(
                Table::create()
                    .table(EmployeeFundLedger::Table)
                    .if_not_exists()
                    .col(pk_auto(EmployeeFundLedger::Id))
                    .col(integer(EmployeeFundLedger::EmployeeId))
                    .col(integer(EmployeeFundLedger::AdminId))
                    .col(decimal_len(EmployeeFundLedger::AmountAllocated, 15, 2).default("0.00"))
                    .col(decimal_len(EmployeeFundLedger::AmountSpent, 15, 2).default("0.00"))
                    .col(decimal_len(EmployeeFundLedger::RemainingBalance, 15, 2).default("0.00"))
                    .col(timestamp_with_time_zone(EmployeeFundLedger::CreatedAt))
                    .col(timestamp_with_time_zone(EmployeeFundLedger::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_fund_ledger_employee")
                            .from(EmployeeFundLedger::Table, EmployeeFundLedger::EmployeeId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_fund_ledger_admin")
                            .from(EmployeeFundLedger::Table, EmployeeFundLedger::AdminId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // An employee holds at most one fund per supervising admin.
        manager
            .create_index(
                Index::create()
                    .name("idx_employee_fund_ledger_pair")
                    .table(EmployeeFundLedger::Table)
                    .col(EmployeeFundLedger::EmployeeId)
                    .col(EmployeeFundLedger::AdminId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create expenses table
        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(pk_auto(Expenses::Id))
                    .col(integer(Expenses::EmployeeId))
                    .col(integer(Expenses::AdminId))
                    .col(string(Expenses::Title))
                    .col(text_null(Expenses::Description))
                    .col(decimal_len(Expenses::Amount, 15, 2))
                    .col(string_len(Expenses::Status, 20).default("pending"))
                    .col(string_null(Expenses::DocumentPath))
                    .col(string_null(Expenses::SiteName))
                    .col(timestamp_with_time_zone(Expenses::CreatedAt))
                    .col(timestamp_with_time_zone(Expenses::UpdatedAt))
                    .col(timestamp_with_time_zone_null(Expenses::ApprovedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_employee")
                            .from(Expenses::Table, Expenses::EmployeeId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_expense_admin")
                            .from(Expenses::Table, Expenses::AdminId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_employee_admin")
                    .table(Expenses::Table)
                    .col(Expenses::EmployeeId)
                    .col(Expenses::AdminId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_status")
                    .table(Expenses::Table)
                    .col(Expenses::Status)
                    .to_owned(),
            )
            .await?;

        // Create transactions table. Party and expense references use
        // SET NULL so the audit trail outlives account/expense deletion.
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(pk_auto(Transactions::Id))
                    .col(integer_null(Transactions::SenderId))
                    .col(integer_null(Transactions::ReceiverId))
                    .col(integer_null(Transactions::ExpenseId))
                    .col(string_len(Transactions::Kind, 20))
                    .col(decimal_len(Transactions::Amount, 15, 2))
                    .col(text(Transactions::Description))
                    .col(string_null(Transactions::SiteName))
                    .col(timestamp_with_time_zone(Transactions::Timestamp))
                    .col(timestamp_with_time_zone(Transactions::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_sender")
                            .from(Transactions::Table, Transactions::SenderId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_receiver")
                            .from(Transactions::Table, Transactions::ReceiverId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_expense")
                            .from(Transactions::Table, Transactions::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_sender_receiver")
                    .table(Transactions::Table)
                    .col(Transactions::SenderId)
                    .col(Transactions::ReceiverId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_kind_timestamp")
                    .table(Transactions::Table)
                    .col(Transactions::Kind)
                    .col(Transactions::Timestamp)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order to avoid foreign key constraints
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Expenses::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(EmployeeFundLedger::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BudgetLedger::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Accounts {
    Table,
    Id,
    Name,
    Email,
    Phone,
    PasswordHash,
    Role,
    SupervisorId,
    CreatedBy,
    IsActive,
    LastLoginAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum BudgetLedger {
    Table,
    Id,
    AdminId,
    TotalBudget,
    TotalSpent,
    Remaining,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum EmployeeFundLedger {
    Table,
    Id,
    EmployeeId,
    AdminId,
    AmountAllocated,
    AmountSpent,
    RemainingBalance,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Expenses {
    Table,
    Id,
    EmployeeId,
    AdminId,
    Title,
    Description,
    Amount,
    Status,
    DocumentPath,
    SiteName,
    CreatedAt,
    UpdatedAt,
    ApprovedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    SenderId,
    ReceiverId,
    ExpenseId,
    Kind,
    Amount,
    Description,
    SiteName,
    Timestamp,
    CreatedAt,
}
