pub mod accounts;
pub mod budgets;
pub mod expenses;
pub mod funds;
pub mod health;
pub mod overview;
pub mod reconcile;
pub mod transactions;
