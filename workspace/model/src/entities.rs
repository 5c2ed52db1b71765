//! Root for all SeaORM entity modules. The schema mirrors the five
//! relational tables of the expense ledger: the account directory, the
//! two denormalized balance ledgers, expense claims, and the
//! append-only transaction log.

pub mod account;
pub mod budget_ledger;
pub mod employee_fund_ledger;
pub mod expense;
pub mod transaction;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::account::Entity as Account;
    pub use super::budget_ledger::Entity as BudgetLedger;
    pub use super::employee_fund_ledger::Entity as EmployeeFundLedger;
    pub use super::expense::Entity as Expense;
    pub use super::transaction::Entity as Transaction;
}
