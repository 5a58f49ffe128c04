use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use super::extractors::{AuthUser, SessionId};
use super::{blocking, created, message, ok, validated, AppState};
use crate::application::auth_service::Registration;
use crate::domain::user::ProfileChanges;
use crate::errors::AppError;

// ── Request DTOs ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last name is required"))]
    pub last_name: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "current password is required"))]
    pub current_password: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, tokens issued"),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let body = validated(body)?;
    let session = blocking(move || {
        state.auth.register(Registration {
            email: body.email,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            phone: body.phone,
        })
    })
    .await?;
    Ok(created(session))
}

/// POST /api/auth/login
///
/// A guest cart sent along in `x-session-id` is folded into the user's cart.
/// A failed merge is logged and does not fail the login.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    params(("x-session-id" = Option<String>, Header, description = "Guest cart to merge")),
    responses(
        (status = 200, description = "Signed in, tokens issued"),
        (status = 401, description = "Invalid credentials or inactive account"),
    ),
    tag = "auth"
)]
pub async fn login(
    state: web::Data<AppState>,
    session: SessionId,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let body = validated(body)?;
    let auth = state.clone();
    let signed_in = blocking(move || auth.auth.login(&body.email, &body.password)).await?;

    if let Some(sid) = session.0 {
        let user_id = signed_in.user.id;
        let cart = state.clone();
        if let Err(e) = blocking(move || cart.cart.merge_session_into_user(&sid, user_id)).await {
            log::warn!("could not merge guest cart into user {user_id}: {e}");
        }
    }
    Ok(ok(signed_in))
}

/// POST /api/auth/refresh
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New token pair"),
        (status = 401, description = "Refresh token invalid or expired"),
    ),
    tag = "auth"
)]
pub async fn refresh(
    state: web::Data<AppState>,
    body: web::Json<RefreshRequest>,
) -> Result<HttpResponse, AppError> {
    let body = validated(body)?;
    let tokens = blocking(move || state.auth.refresh(&body.refresh_token)).await?;
    Ok(ok(tokens))
}

/// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The signed-in user"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(AuthUser(user): AuthUser) -> Result<HttpResponse, AppError> {
    Ok(ok(user))
}

/// PUT /api/auth/profile
#[utoipa::path(
    put,
    path = "/api/auth/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn update_profile(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let body = validated(body)?;
    let changes = ProfileChanges {
        first_name: body.first_name,
        last_name: body.last_name,
        phone: body.phone,
    };
    let user = blocking(move || state.auth.update_profile(user.id, changes)).await?;
    Ok(ok(user))
}

/// PUT /api/auth/password
#[utoipa::path(
    put,
    path = "/api/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Current password is incorrect"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn change_password(
    state: web::Data<AppState>,
    AuthUser(user): AuthUser,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let body = validated(body)?;
    blocking(move || {
        state
            .auth
            .change_password(user.id, &body.current_password, &body.new_password)
    })
    .await?;
    Ok(message("Password changed successfully"))
}
