use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use ledger::directory::{self, AccountUpdate, NewAccount};
use ledger::Actor;
use model::entities::account::{self, Role};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::identity::CurrentAccount;
use crate::schemas::{ledger_error_response, ApiError, ApiResponse, AppState, ErrorResponse};

/// Request body for provisioning a new account
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateAccountRequest {
    /// Display name
    pub name: String,
    /// Login email, unique across all accounts
    pub email: String,
    /// Contact phone number
    pub phone: Option<String>,
    /// Password hash as produced by the authentication gateway
    pub password_hash: String,
    /// Account role: "superadmin", "admin", or "employee"
    pub role: String,
    /// Supervising admin; required for employees
    pub supervisor_id: Option<i32>,
}

/// Request body for updating an account's profile
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateAccountRequest {
    /// Display name
    pub name: Option<String>,
    /// Login email
    pub email: Option<String>,
    /// Contact phone number
    pub phone: Option<String>,
    /// Replacement password hash
    pub password_hash: Option<String>,
}

/// Request body for activating or deactivating an account
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

/// Account response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: String,
    pub supervisor_id: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<account::Model> for AccountResponse {
    fn from(model: account::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            phone: model.phone,
            role: model.role.as_str().to_string(),
            supervisor_id: model.supervisor_id,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

fn parse_role(raw: &str) -> Option<Role> {
    match raw {
        "superadmin" => Some(Role::Superadmin),
        "admin" => Some(Role::Admin),
        "employee" => Some(Role::Employee),
        _ => None,
    }
}

/// Provision a new account
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    tag = "accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account created successfully", body = ApiResponse<AccountResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Caller may not create this account", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor, request))]
pub async fn create_account(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Json(request): Json<CreateAccountRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountResponse>>), ApiError> {
    debug!(
        "Creating {} account '{}' requested by {}",
        request.role,
        request.email,
        actor.id()
    );

    let Some(role) = parse_role(&request.role) else {
        warn!("Rejected unknown role '{}'", request.role);
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                format!("unknown role '{}'", request.role),
                "invalid_role",
            )),
        ));
    };

    let created = directory::provision_account(
        &state.db,
        &actor,
        NewAccount {
            name: request.name,
            email: request.email,
            phone: request.phone,
            password_hash: request.password_hash,
            role,
            supervisor_id: request.supervisor_id,
        },
    )
    .await
    .map_err(ledger_error_response)?;

    // A new admin or employee changes the overview head counts.
    state.cache.invalidate_all();

    info!("Account {} created by {}", created.id, actor.id());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            AccountResponse::from(created),
            "Account created successfully",
        )),
    ))
}

/// List accounts visible to the caller
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    tag = "accounts",
    responses(
        (status = 200, description = "Accounts retrieved successfully", body = ApiResponse<Vec<AccountResponse>>),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor))]
pub async fn get_accounts(
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    let mut query = account::Entity::find();

    // Admins see themselves and their employees; employees only
    // themselves.
    match &actor {
        Actor::Superadmin(_) => {}
        Actor::Admin(a) => {
            query = query.filter(
                Condition::any()
                    .add(account::Column::Id.eq(a.id))
                    .add(account::Column::SupervisorId.eq(a.id)),
            );
        }
        Actor::Employee(e) => {
            query = query.filter(account::Column::Id.eq(e.id));
        }
    }

    let accounts = query
        .order_by_asc(account::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| ledger_error_response(e.into()))?;

    debug!("Listed {} accounts for {}", accounts.len(), actor.id());
    Ok(Json(ApiResponse::new(
        accounts.into_iter().map(AccountResponse::from).collect(),
        "Accounts retrieved successfully",
    )))
}

/// Get a specific account by ID
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    responses(
        (status = 200, description = "Account retrieved successfully", body = ApiResponse<AccountResponse>),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor))]
pub async fn get_account(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let not_found = || {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new(
                format!("account {account_id} not found"),
                "not_found",
            )),
        )
    };

    let found = account::Entity::find_by_id(account_id)
        .one(&state.db)
        .await
        .map_err(|e| ledger_error_response(e.into()))?
        .ok_or_else(|| {
            warn!("Account {} not found", account_id);
            not_found()
        })?;

    let visible = match &actor {
        Actor::Superadmin(_) => true,
        Actor::Admin(a) => found.id == a.id || found.supervisor_id == Some(a.id),
        Actor::Employee(e) => found.id == e.id,
    };
    if !visible {
        // Hidden accounts are indistinguishable from missing ones.
        return Err(not_found());
    }

    Ok(Json(ApiResponse::new(
        AccountResponse::from(found),
        "Account retrieved successfully",
    )))
}

/// Update an account's profile
#[utoipa::path(
    put,
    path = "/api/v1/accounts/{account_id}",
    tag = "accounts",
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated successfully", body = ApiResponse<AccountResponse>),
        (status = 403, description = "Caller may not modify this account", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse),
        (status = 409, description = "Email already in use", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor, request))]
pub async fn update_account(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let updated = directory::update_account(
        &state.db,
        &actor,
        account_id,
        AccountUpdate {
            name: request.name,
            email: request.email,
            phone: request.phone.map(Some),
            password_hash: request.password_hash,
        },
    )
    .await
    .map_err(ledger_error_response)?;

    info!("Account {} updated by {}", updated.id, actor.id());
    Ok(Json(ApiResponse::new(
        AccountResponse::from(updated),
        "Account updated successfully",
    )))
}

/// Activate or deactivate an account
#[utoipa::path(
    patch,
    path = "/api/v1/accounts/{account_id}/active",
    tag = "accounts",
    params(
        ("account_id" = i32, Path, description = "Account ID"),
    ),
    request_body = SetActiveRequest,
    responses(
        (status = 200, description = "Account state changed", body = ApiResponse<AccountResponse>),
        (status = 403, description = "Superadmin role required", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, actor, request))]
pub async fn set_account_active(
    Path(account_id): Path<i32>,
    State(state): State<AppState>,
    CurrentAccount(actor): CurrentAccount,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let updated = directory::set_active(&state.db, &actor, account_id, request.is_active)
        .await
        .map_err(ledger_error_response)?;

    // Activation changes the active head counts the overview reports.
    state.cache.invalidate_all();

    Ok(Json(ApiResponse::new(
        AccountResponse::from(updated),
        if request.is_active {
            "Account activated"
        } else {
            "Account deactivated"
        },
    )))
}
