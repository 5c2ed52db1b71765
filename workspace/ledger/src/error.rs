use rust_decimal::Decimal;
use thiserror::Error;

/// Error types for ledger operations.
///
/// Every variant except `Database` and `Storage` is a precondition
/// failure detected before any mutation; callers can rely on the
/// ledger being untouched when one of these is returned.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The caller's role or ownership does not permit the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A referenced account, expense, or fund does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A monetary amount was zero or negative.
    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),

    /// A budget or fund balance is too low for the requested movement.
    #[error("insufficient funds: {available} available, {requested} requested")]
    InsufficientFunds {
        available: Decimal,
        requested: Decimal,
    },

    /// The expense is not in the `pending` state.
    #[error("expense {expense_id} is {status}, not pending")]
    InvalidState { expense_id: i32, status: String },

    /// A uniqueness constraint would be violated.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// Document storage failed. Best-effort cleanup paths log this
    /// instead of returning it; the ledger state stays authoritative.
    #[error("document storage failure: {0}")]
    Storage(String),

    /// Error from the database layer.
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Type alias for Result with LedgerError.
pub type Result<T> = std::result::Result<T, LedgerError>;
