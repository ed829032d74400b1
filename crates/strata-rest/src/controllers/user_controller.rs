//! User management controller.

use crate::{
    extractors::{AuthenticatedUser, PaginationQuery, ValidatedJson},
    responses::{created, no_content, ok, ApiResponse, ApiResult, AppError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use strata_core::{ErrorResponse, StrataError, UserId};
use strata_security::ClaimsExt;
use strata_service::{
    CreateUserRequest, SetPasswordRequest, UpdateUserRequest, UserListResponse, UserResponse,
};
use tracing::debug;

/// Creates the user router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
        .route("/:id/password", put(set_password))
}

/// Page through users. Soft-deleted users are hidden unless an authority
/// asks for them.
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(PaginationQuery),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "One page of users", body = UserListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "include_deleted without authority", body = ErrorResponse)
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(pagination): Query<PaginationQuery>,
) -> ApiResult<UserListResponse> {
    debug!("List users request");

    let include_deleted = pagination.include_deleted();
    if include_deleted {
        user.require_authority()?;
    }

    let response = state
        .user_reader
        .get_all_users((&pagination).into(), include_deleted)
        .await?;
    ok(response)
}

/// Create a user (authority only).
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Authority required", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), AppError> {
    debug!("Create user request: {}", request.email);

    user.require_authority()?;

    let response = state
        .user_writer
        .create_user(request, Some(user.id()?))
        .await?;
    Ok(created(response))
}

/// Get a user by ID.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "The user", body = UserResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<String>,
) -> ApiResult<UserResponse> {
    debug!("Get user request: {}", id);

    let user_id = parse_user_id(&id)?;
    let response = state.user_reader.get_user(user_id).await?;
    ok(response)
}

/// Update a profile (the user themself or an authority).
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    request_body = UpdateUserRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 403, description = "Not permitted", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<UserResponse> {
    debug!("Update user request: {}", id);

    let user_id = parse_user_id(&id)?;
    user.require_self_or_authority(user_id)?;

    let response = state
        .user_writer
        .update_user(user_id, request, Some(user.id()?))
        .await?;
    ok(response)
}

/// Soft-delete a user (authority only).
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Authority required", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    debug!("Delete user request: {}", id);

    user.require_authority()?;

    let user_id = parse_user_id(&id)?;
    state.user_writer.delete_user(user_id, Some(user.id()?)).await?;

    Ok(no_content())
}

/// Replace a password (the user themself or an authority).
#[utoipa::path(
    put,
    path = "/users/{id}/password",
    tag = "users",
    params(("id" = String, Path, description = "User id")),
    request_body = SetPasswordRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Password too weak", body = ErrorResponse),
        (status = 403, description = "Not permitted", body = ErrorResponse)
    )
)]
pub async fn set_password(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<SetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    debug!("Set password request: {}", id);

    let user_id = parse_user_id(&id)?;
    user.require_self_or_authority(user_id)?;

    state
        .user_writer
        .set_password(user_id, request, Some(user.id()?))
        .await?;
    Ok(no_content())
}

/// Helper to parse user ID from path parameter.
fn parse_user_id(id: &str) -> Result<UserId, AppError> {
    UserId::parse(id).map_err(|_| AppError(StrataError::Validation(format!("Invalid user ID: {id}"))))
}
