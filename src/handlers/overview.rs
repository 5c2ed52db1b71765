use axum::{extract::State, response::Json};
use common::summaries::OverviewCounts;
use ledger::query;
use tracing::{debug, instrument};

use crate::identity::CurrentAccount;
use crate::schemas::{ledger_error_response, ApiError, ApiResponse, AppState, ErrorResponse};

const OVERVIEW_CACHE_KEY: &str = "overview";

/// Headline totals for the superadmin dashboard
///
/// Results are cached briefly; any ledger mutation invalidates the
/// cache.
#[utoipa::path(
    get,
    path = "/api/v1/overview",
    tag = "overview",
    responses(
        (status = 200, description = "Overview retrieved", body = ApiResponse<OverviewCounts>),
        (status = 403, description = "Superadmin role required", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor))]
pub async fn get_overview(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
) -> Result<Json<ApiResponse<OverviewCounts>>, ApiError> {
    // Authorization runs before the cache so a cached result never
    // leaks to the wrong role.
    actor
        .require_superadmin()
        .map_err(ledger_error_response)?;

    if let Some(cached) = state.cache.get(OVERVIEW_CACHE_KEY).await {
        debug!("Overview served from cache");
        return Ok(Json(ApiResponse::new(cached, "Overview retrieved")));
    }

    let counts = query::overview(&state.db, &actor)
        .await
        .map_err(ledger_error_response)?;
    state
        .cache
        .insert(OVERVIEW_CACHE_KEY.to_string(), counts.clone())
        .await;

    Ok(Json(ApiResponse::new(counts, "Overview retrieved")))
}
