use axum::{extract::State, response::Json};
use common::reconciliation::ReconciliationReport;
use ledger::reconcile;
use tracing::{instrument, warn};

use crate::identity::CurrentAccount;
use crate::schemas::{ledger_error_response, ApiError, ApiResponse, AppState, ErrorResponse};

/// Check the ledger balances against the transaction log
#[utoipa::path(
    post,
    path = "/api/v1/reconcile",
    tag = "reconcile",
    responses(
        (status = 200, description = "Reconciliation finished", body = ApiResponse<ReconciliationReport>),
        (status = 403, description = "Superadmin role required", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor))]
pub async fn run_reconciliation(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
) -> Result<Json<ApiResponse<ReconciliationReport>>, ApiError> {
    actor
        .require_superadmin()
        .map_err(ledger_error_response)?;

    let report = reconcile::reconcile_all(&state.db)
        .await
        .map_err(ledger_error_response)?;

    let message = if report.is_clean() {
        "Ledger reconciles with the transaction log"
    } else {
        warn!("Reconciliation found {} drifted columns", report.drifts.len());
        "Ledger drift detected"
    };
    Ok(Json(ApiResponse::new(report, message)))
}
