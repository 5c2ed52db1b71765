use axum::{
    extract::{Path, State},
    response::Json,
};
use common::summaries::FundSummary;
use ledger::ops::{self, AllocateFund};
use ledger::query;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::identity::CurrentAccount;
use crate::schemas::{ledger_error_response, ApiError, ApiResponse, AppState, ErrorResponse};

/// Request body for allocating funds to an employee
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AllocateFundRequest {
    /// Receiving employee; must be supervised by the calling admin
    pub employee_id: i32,
    /// Amount to allocate; must be positive and within the admin's
    /// remaining budget
    pub amount: Decimal,
    /// Site the allocation is earmarked for
    pub site_name: String,
    /// Free-form note carried on the transaction log entry
    pub description: Option<String>,
}

/// Allocate funds from an admin's budget to a supervised employee
#[utoipa::path(
    post,
    path = "/api/v1/funds/allocate",
    tag = "funds",
    request_body = AllocateFundRequest,
    responses(
        (status = 200, description = "Funds allocated", body = ApiResponse<FundSummary>),
        (status = 400, description = "Invalid amount", body = ErrorResponse),
        (status = 403, description = "Not the employee's supervisor", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse),
        (status = 422, description = "Insufficient budget", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor, request))]
pub async fn allocate_fund(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Json(request): Json<AllocateFundRequest>,
) -> Result<Json<ApiResponse<FundSummary>>, ApiError> {
    let employee_id = request.employee_id;
    let fund = ops::allocate_fund(
        &state.db,
        &actor,
        AllocateFund {
            employee_id: request.employee_id,
            amount: request.amount,
            site_name: request.site_name,
            description: request.description,
        },
    )
    .await
    .map_err(ledger_error_response)?;

    state.cache.invalidate_all();

    info!(
        "Fund for employee {} now holds {}",
        employee_id, fund.remaining_balance
    );
    Ok(Json(ApiResponse::new(
        FundSummary {
            employee_id: fund.employee_id,
            admin_id: fund.admin_id,
            amount_allocated: fund.amount_allocated,
            amount_spent: fund.amount_spent,
            remaining_balance: fund.remaining_balance,
        },
        "Funds allocated",
    )))
}

/// Get an employee's fund position
#[utoipa::path(
    get,
    path = "/api/v1/employees/{employee_id}/fund",
    tag = "funds",
    params(
        ("employee_id" = i32, Path, description = "Employee account ID"),
    ),
    responses(
        (status = 200, description = "Fund retrieved", body = ApiResponse<FundSummary>),
        (status = 403, description = "Caller may not read this fund", body = ErrorResponse),
        (status = 404, description = "Employee not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor))]
pub async fn get_employee_fund(
    Path(employee_id): Path<i32>,
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
) -> Result<Json<ApiResponse<FundSummary>>, ApiError> {
    let summary = query::get_employee_fund(&state.db, &actor, employee_id)
        .await
        .map_err(ledger_error_response)?;

    Ok(Json(ApiResponse::new(summary, "Fund retrieved")))
}

/// List every fund under one admin
#[utoipa::path(
    get,
    path = "/api/v1/admins/{admin_id}/funds",
    tag = "funds",
    params(
        ("admin_id" = i32, Path, description = "Admin account ID"),
    ),
    responses(
        (status = 200, description = "Funds retrieved", body = ApiResponse<Vec<FundSummary>>),
        (status = 403, description = "Caller may not list these funds", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor))]
pub async fn get_admin_funds(
    Path(admin_id): Path<i32>,
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
) -> Result<Json<ApiResponse<Vec<FundSummary>>>, ApiError> {
    let funds = query::list_funds_for_admin(&state.db, &actor, admin_id)
        .await
        .map_err(ledger_error_response)?;

    Ok(Json(ApiResponse::new(funds, "Funds retrieved")))
}
