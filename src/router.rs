use crate::handlers::{
    accounts::{create_account, get_account, get_accounts, set_account_active, update_account},
    budgets::{allocate_budget, get_admin_budget},
    expenses::{approve_expense, get_expense, get_expenses, reject_expense, submit_expense},
    funds::{allocate_fund, get_admin_funds, get_employee_fund},
    health::health_check,
    overview::get_overview,
    reconcile::run_reconciliation,
    transactions::get_transactions,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Account provisioning and lifecycle
        .route("/api/v1/accounts", post(create_account))
        .route("/api/v1/accounts", get(get_accounts))
        .route("/api/v1/accounts/:account_id", get(get_account))
        .route("/api/v1/accounts/:account_id", put(update_account))
        .route("/api/v1/accounts/:account_id/active", patch(set_account_active))
        // Budget ledger
        .route("/api/v1/budgets/allocate", post(allocate_budget))
        .route("/api/v1/admins/:admin_id/budget", get(get_admin_budget))
        // Employee funds
        .route("/api/v1/funds/allocate", post(allocate_fund))
        .route("/api/v1/admins/:admin_id/funds", get(get_admin_funds))
        .route("/api/v1/employees/:employee_id/fund", get(get_employee_fund))
        // Expense workflow
        .route("/api/v1/expenses", post(submit_expense))
        .route("/api/v1/expenses", get(get_expenses))
        .route("/api/v1/expenses/:expense_id", get(get_expense))
        .route("/api/v1/expenses/:expense_id/approve", post(approve_expense))
        .route("/api/v1/expenses/:expense_id/reject", post(reject_expense))
        // Transaction log
        .route("/api/v1/transactions", get(get_transactions))
        // Dashboards and maintenance
        .route("/api/v1/overview", get(get_overview))
        .route("/api/v1/reconcile", post(run_reconciliation))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
