//! Resolves the calling account for a request.
//!
//! The engine trusts an upstream gateway to authenticate callers and
//! forward the account id in the `X-Account-Id` header. This
//! extractor turns that id into a role-checked [`Actor`]; password
//! verification and session handling live outside this service.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::Json;
use ledger::{Actor, LedgerError};
use model::entities::account;
use sea_orm::EntityTrait;
use tracing::warn;

use crate::schemas::{ApiError, AppState, ErrorResponse};

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// The authenticated caller, ready for role checks.
pub struct CurrentAccount(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACCOUNT_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new(
                        "Missing X-Account-Id header",
                        "unauthenticated",
                    )),
                )
            })?;

        let account_id: i32 = raw.parse().map_err(|_| {
            warn!("Malformed X-Account-Id header: {raw}");
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    "Malformed X-Account-Id header",
                    "unauthenticated",
                )),
            )
        })?;

        let account = account::Entity::find_by_id(account_id)
            .one(&state.db)
            .await
            .map_err(|e| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse::new(e.to_string(), "internal_error")),
                )
            })?
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorResponse::new(
                        format!("Unknown account {account_id}"),
                        "unauthenticated",
                    )),
                )
            })?;

        let actor = Actor::from_account(account).map_err(|e| match e {
            LedgerError::Unauthorized(msg) => (
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::new(msg, "forbidden")),
            ),
            other => crate::schemas::ledger_error_response(other),
        })?;

        Ok(CurrentAccount(actor))
    }
}
