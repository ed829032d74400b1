//! OpenAPI documentation for the REST API.

use crate::controllers::HealthResponse;
use strata_core::{ErrorResponse, FieldError, UserId};
use strata_service::{
    CreateUserRequest, LoginRequest, RefreshTokenRequest, SetPasswordRequest, TokenResponse,
    UpdateUserRequest, UserListResponse, UserResponse,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation for the Strata API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Strata API",
        version = "1.0.0",
        description = "Login and user management over the Strata DAO/service layers",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        crate::controllers::auth_controller::login,
        crate::controllers::auth_controller::refresh_token,
        crate::controllers::auth_controller::get_current_user,
        crate::controllers::user_controller::list_users,
        crate::controllers::user_controller::create_user,
        crate::controllers::user_controller::get_user,
        crate::controllers::user_controller::update_user,
        crate::controllers::user_controller::delete_user,
        crate::controllers::user_controller::set_password,
        crate::controllers::health_controller::health_check,
        crate::controllers::health_controller::readiness_check,
        crate::controllers::health_controller::liveness_check,
    ),
    components(
        schemas(
            UserId,
            ErrorResponse,
            FieldError,
            HealthResponse,
            LoginRequest,
            RefreshTokenRequest,
            TokenResponse,
            CreateUserRequest,
            UpdateUserRequest,
            SetPasswordRequest,
            UserResponse,
            UserListResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "users", description = "User management endpoints"),
        (name = "health", description = "Health check endpoints")
    )
)]
pub struct ApiDoc;

/// Security addon for JWT Bearer authentication.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token authentication"))
                        .build(),
                ),
            );
        }
    }
}
