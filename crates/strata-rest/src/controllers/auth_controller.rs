//! Authentication controller.

use crate::{
    extractors::{AuthenticatedUser, ClientIp, ValidatedJson},
    responses::{ok, ApiResult},
    state::AppState,
};
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use strata_core::{ErrorResponse, StrataError};
use strata_service::{LoginRequest, RefreshTokenRequest, TokenResponse, UserResponse};
use tracing::debug;

/// Creates the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/login/", post(login))
        .route("/refresh", post(refresh_token))
        .route("/me", get(get_current_user))
}

/// Exchange email and password for an access/refresh token pair.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = TokenResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    client_ip: ClientIp,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    debug!("Login request for: {}", request.email);

    let response = state
        .auth_service
        .login(request, client_ip.into_inner())
        .await?;
    ok(response)
}

/// Exchange a refresh token for a new pair.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    tag = "auth",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<RefreshTokenRequest>,
) -> ApiResult<TokenResponse> {
    debug!("Token refresh request");

    let response = state.auth_service.refresh(request).await?;
    ok(response)
}

/// The authenticated caller.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> ApiResult<UserResponse> {
    let id = user.id()?;
    debug!("Get current user: {}", id);

    let response = state.user_reader.get_user(id).await?;
    if response.deleted || response.inactive {
        return Err(StrataError::unauthorized("Account is no longer active").into());
    }
    ok(response)
}
