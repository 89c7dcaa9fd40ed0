use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{PrincipalModel, Role};
use crate::response::ApiResponse;
use crate::services::auth::{AuthService, Registration};
use axum::{response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Login handle, shown to reviewers (3-50 characters)
    #[serde(default, alias = "username")]
    pub display_name: String,
    /// Password
    #[serde(default)]
    #[validate(length(max = 72))]
    pub password: String,
    /// DRIVER or REVIEWER
    #[serde(default)]
    pub role: String,
    /// Invitation code, required for REVIEWER
    #[serde(alias = "logist_code")]
    pub invite_code: Option<String>,
    /// Phone, e-mail or any other contact detail
    #[validate(length(max = 200))]
    pub contact: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default, alias = "username")]
    pub display_name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrincipalResponse {
    pub id: i32,
    pub display_name: String,
    pub contact: Option<String>,
    pub role: Role,
}

impl From<PrincipalModel> for PrincipalResponse {
    fn from(p: PrincipalModel) -> Self {
        Self {
            id: p.id,
            display_name: p.display_name,
            contact: p.contact,
            role: p.role,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// Bearer token for subsequent calls
    pub token: String,
    pub principal: PrincipalResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MeResponse {
    pub principal: PrincipalResponse,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Principal registered", body = AuthResponse),
        (status = 400, description = "ROLE_INVALID, IDENTIFIER_INVALID or WEAK_SECRET", body = AppError),
        (status = 403, description = "INVITE_REQUIRED or INVITE_INVALID", body = AppError),
        (status = 409, description = "IDENTIFIER_TAKEN", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    let (principal, token) = service
        .register(Registration {
            display_name: &payload.display_name,
            password: &payload.password,
            role: &payload.role,
            invite_code: payload.invite_code.as_deref(),
            contact: payload.contact.as_deref(),
        })
        .await?;

    Ok(ApiResponse::ok(AuthResponse {
        token,
        principal: principal.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "INVALID_CREDENTIALS", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (principal, token) = service
        .login(&payload.display_name, &payload.password)
        .await?;

    Ok(ApiResponse::ok(AuthResponse {
        token,
        principal: principal.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current principal", body = MeResponse),
        (status = 401, description = "NO_TOKEN or BAD_TOKEN", body = AppError),
    ),
    tag = "auth"
)]
pub async fn me(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let principal = AuthService::new(db)
        .find_principal(auth_user.id)
        .await?
        .ok_or(AppError::BadToken)?;

    Ok(ApiResponse::ok(MeResponse {
        principal: principal.into(),
    }))
}
