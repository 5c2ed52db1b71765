use std::fmt;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::Json;
use common::filters::{ExpenseFilter, TransactionFilter};
use common::reconciliation::{LedgerDrift, ReconciliationReport};
use common::summaries::{BudgetSummary, FundSummary, OverviewCounts};
use ledger::store::DocumentStore;
use ledger::LedgerError;
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{OpenApi, ToSchema};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for dashboard aggregates
    pub cache: Cache<String, OverviewCounts>,
    /// Storage backing expense documents
    pub documents: Arc<dyn DocumentStore>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            success: false,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Maps an engine error to its HTTP representation.
pub fn ledger_error_response(err: LedgerError) -> ApiError {
    let (status, code) = match &err {
        LedgerError::Unauthorized(_) => (StatusCode::FORBIDDEN, "forbidden"),
        LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        LedgerError::InvalidAmount(_) => (StatusCode::BAD_REQUEST, "invalid_amount"),
        LedgerError::InsufficientFunds { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_funds")
        }
        LedgerError::InvalidState { .. } => (StatusCode::CONFLICT, "invalid_state"),
        LedgerError::AlreadyExists(_) => (StatusCode::CONFLICT, "already_exists"),
        LedgerError::Storage(_) | LedgerError::Database(_) => {
            error!("Internal error: {}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
        }
    };
    (status, Json(ErrorResponse::new(err.to_string(), code)))
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::accounts::create_account,
        crate::handlers::accounts::get_accounts,
        crate::handlers::accounts::get_account,
        crate::handlers::accounts::update_account,
        crate::handlers::accounts::set_account_active,
        crate::handlers::budgets::allocate_budget,
        crate::handlers::budgets::get_admin_budget,
        crate::handlers::funds::allocate_fund,
        crate::handlers::funds::get_employee_fund,
        crate::handlers::funds::get_admin_funds,
        crate::handlers::expenses::submit_expense,
        crate::handlers::expenses::get_expenses,
        crate::handlers::expenses::get_expense,
        crate::handlers::expenses::approve_expense,
        crate::handlers::expenses::reject_expense,
        crate::handlers::transactions::get_transactions,
        crate::handlers::overview::get_overview,
        crate::handlers::reconcile::run_reconciliation,
    ),
    components(
        schemas(
            ApiResponse<crate::handlers::accounts::AccountResponse>,
            ApiResponse<crate::handlers::expenses::ExpenseResponse>,
            ApiResponse<BudgetSummary>,
            ApiResponse<FundSummary>,
            ApiResponse<OverviewCounts>,
            ApiResponse<ReconciliationReport>,
            ErrorResponse,
            HealthResponse,
            BudgetSummary,
            FundSummary,
            OverviewCounts,
            LedgerDrift,
            ReconciliationReport,
            TransactionFilter,
            ExpenseFilter,
            crate::handlers::accounts::CreateAccountRequest,
            crate::handlers::accounts::UpdateAccountRequest,
            crate::handlers::accounts::SetActiveRequest,
            crate::handlers::accounts::AccountResponse,
            crate::handlers::budgets::AllocateBudgetRequest,
            crate::handlers::funds::AllocateFundRequest,
            crate::handlers::expenses::SubmitExpenseRequest,
            crate::handlers::expenses::ExpenseResponse,
            crate::handlers::transactions::TransactionResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "accounts", description = "Account provisioning and lifecycle"),
        (name = "budgets", description = "Superadmin to admin budget allocation"),
        (name = "funds", description = "Admin to employee fund allocation"),
        (name = "expenses", description = "Expense claim workflow"),
        (name = "transactions", description = "Append-only transaction log"),
        (name = "overview", description = "Dashboard aggregates"),
        (name = "reconcile", description = "Ledger consistency checks"),
    ),
    info(
        title = "FundLedger API",
        description = "Role-based expense management with a consistency-checked fund ledger",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
