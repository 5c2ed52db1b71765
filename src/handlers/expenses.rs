use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use common::filters::ExpenseFilter;
use ledger::ops::{self, NewExpense};
use ledger::query;
use model::entities::expense;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::identity::CurrentAccount;
use crate::schemas::{ledger_error_response, ApiError, ApiResponse, AppState, ErrorResponse};

/// Request body for submitting an expense claim
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SubmitExpenseRequest {
    /// Short title shown in review lists
    pub title: String,
    /// Longer description of the expense
    pub description: Option<String>,
    /// Claimed amount; must be positive
    pub amount: Decimal,
    /// Site the expense belongs to
    pub site_name: Option<String>,
    /// Reference to an uploaded supporting document
    pub document_path: Option<String>,
}

/// Expense claim response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExpenseResponse {
    pub id: i32,
    pub employee_id: i32,
    pub admin_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub status: String,
    pub document_path: Option<String>,
    pub site_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl From<expense::Model> for ExpenseResponse {
    fn from(model: expense::Model) -> Self {
        Self {
            id: model.id,
            employee_id: model.employee_id,
            admin_id: model.admin_id,
            title: model.title,
            description: model.description,
            amount: model.amount,
            status: model.status.as_str().to_string(),
            document_path: model.document_path,
            site_name: model.site_name,
            created_at: model.created_at,
            approved_at: model.approved_at,
        }
    }
}

/// Submit an expense claim
#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    tag = "expenses",
    request_body = SubmitExpenseRequest,
    responses(
        (status = 201, description = "Expense submitted", body = ApiResponse<ExpenseResponse>),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 403, description = "Employee role required", body = ErrorResponse),
        (status = 404, description = "No supervising admin or fund", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor, request))]
pub async fn submit_expense(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Json(request): Json<SubmitExpenseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ExpenseResponse>>), ApiError> {
    let claim = ops::submit_expense(
        &state.db,
        &actor,
        NewExpense {
            title: request.title,
            description: request.description,
            amount: request.amount,
            site_name: request.site_name,
            document_path: request.document_path,
        },
    )
    .await
    .map_err(ledger_error_response)?;

    state.cache.invalidate_all();

    info!("Expense {} submitted by {}", claim.id, actor.id());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ExpenseResponse::from(claim),
            "Expense submitted",
        )),
    ))
}

/// List expense claims visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/expenses",
    tag = "expenses",
    params(ExpenseFilter),
    responses(
        (status = 200, description = "Expenses retrieved", body = ApiResponse<Vec<ExpenseResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor, filter))]
pub async fn get_expenses(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<ApiResponse<Vec<ExpenseResponse>>>, ApiError> {
    let claims = query::list_expenses(&state.db, &actor, &filter)
        .await
        .map_err(ledger_error_response)?;

    Ok(Json(ApiResponse::new(
        claims.into_iter().map(ExpenseResponse::from).collect(),
        "Expenses retrieved",
    )))
}

/// Get a single expense claim
#[utoipa::path(
    get,
    path = "/api/v1/expenses/{expense_id}",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense retrieved", body = ApiResponse<ExpenseResponse>),
        (status = 404, description = "Expense not found or not visible", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor))]
pub async fn get_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
) -> Result<Json<ApiResponse<ExpenseResponse>>, ApiError> {
    let claim = query::get_expense(&state.db, &actor, expense_id)
        .await
        .map_err(ledger_error_response)?;

    Ok(Json(ApiResponse::new(
        ExpenseResponse::from(claim),
        "Expense retrieved",
    )))
}

/// Approve a pending expense claim
#[utoipa::path(
    post,
    path = "/api/v1/expenses/{expense_id}/approve",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense approved", body = ApiResponse<ExpenseResponse>),
        (status = 403, description = "Not the reviewing admin", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 409, description = "Expense is not pending", body = ErrorResponse),
        (status = 422, description = "Insufficient fund balance", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor))]
pub async fn approve_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
) -> Result<Json<ApiResponse<ExpenseResponse>>, ApiError> {
    let claim = ops::approve_expense(&state.db, &actor, expense_id)
        .await
        .map_err(ledger_error_response)?;

    state.cache.invalidate_all();

    Ok(Json(ApiResponse::new(
        ExpenseResponse::from(claim),
        "Expense approved",
    )))
}

/// Reject a pending expense claim
#[utoipa::path(
    post,
    path = "/api/v1/expenses/{expense_id}/reject",
    tag = "expenses",
    params(
        ("expense_id" = i32, Path, description = "Expense ID"),
    ),
    responses(
        (status = 200, description = "Expense rejected", body = ApiResponse<ExpenseResponse>),
        (status = 403, description = "Not the reviewing admin", body = ErrorResponse),
        (status = 404, description = "Expense not found", body = ErrorResponse),
        (status = 409, description = "Expense is not pending", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor))]
pub async fn reject_expense(
    Path(expense_id): Path<i32>,
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
) -> Result<Json<ApiResponse<ExpenseResponse>>, ApiError> {
    let claim = ops::reject_expense(&state.db, &actor, expense_id, state.documents.as_ref())
        .await
        .map_err(ledger_error_response)?;

    state.cache.invalidate_all();

    Ok(Json(ApiResponse::new(
        ExpenseResponse::from(claim),
        "Expense rejected",
    )))
}
