use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use common::filters::TransactionFilter;
use ledger::query;
use model::entities::transaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::identity::CurrentAccount;
use crate::schemas::{ledger_error_response, ApiError, ApiResponse, AppState, ErrorResponse};

/// Transaction log entry response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: i32,
    pub sender_id: Option<i32>,
    pub receiver_id: Option<i32>,
    pub expense_id: Option<i32>,
    pub kind: String,
    pub amount: Decimal,
    pub description: String,
    pub site_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<transaction::Model> for TransactionResponse {
    fn from(model: transaction::Model) -> Self {
        Self {
            id: model.id,
            sender_id: model.sender_id,
            receiver_id: model.receiver_id,
            expense_id: model.expense_id,
            kind: model.kind.as_str().to_string(),
            amount: model.amount,
            description: model.description,
            site_name: model.site_name,
            timestamp: model.timestamp,
        }
    }
}

/// List transaction log entries visible to the caller, newest first
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    tag = "transactions",
    params(TransactionFilter),
    responses(
        (status = 200, description = "Transactions retrieved", body = ApiResponse<Vec<TransactionResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor, filter))]
pub async fn get_transactions(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<ApiResponse<Vec<TransactionResponse>>>, ApiError> {
    let entries = query::list_transactions(&state.db, &actor, &filter)
        .await
        .map_err(ledger_error_response)?;

    Ok(Json(ApiResponse::new(
        entries.into_iter().map(TransactionResponse::from).collect(),
        "Transactions retrieved",
    )))
}
