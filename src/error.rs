use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Missing bearer token")]
    NoToken,

    #[error("Invalid or expired token")]
    BadToken,

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Forbidden")]
    Forbidden,

    #[error("Report not found")]
    NotFound,

    #[error("Origin and destination cities are required")]
    RouteRequired,

    #[error("Identifier must be a positive integer")]
    BadId,

    #[error("Status must be one of PENDING, APPROVED, REJECTED")]
    BadStatus,

    #[error("Direction must be LOADING or UNLOADING")]
    BadDirection,

    #[error("Distance must be a non-negative number")]
    BadDistance,

    #[error("Role must be DRIVER or REVIEWER")]
    RoleInvalid,

    #[error("Display name must be 3 to 50 characters")]
    IdentifierInvalid,

    #[error("Display name is already registered")]
    IdentifierTaken,

    #[error("Password must be at least {0} characters")]
    WeakSecret(usize),

    #[error("Invitation code is required for the reviewer role")]
    InviteRequired,

    #[error("Invitation code is invalid")]
    InviteInvalid,

    #[error("Reviewer registration is not configured on this server")]
    InviteNotConfigured,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code returned in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "SERVER_ERROR",
            AppError::NoToken => "NO_TOKEN",
            AppError::BadToken => "BAD_TOKEN",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::Forbidden => "FORBIDDEN",
            AppError::NotFound => "NOT_FOUND",
            AppError::RouteRequired => "ROUTE_REQUIRED",
            AppError::BadId => "BAD_ID",
            AppError::BadStatus => "BAD_STATUS",
            AppError::BadDirection => "BAD_DIRECTION",
            AppError::BadDistance => "BAD_DISTANCE",
            AppError::RoleInvalid => "ROLE_INVALID",
            AppError::IdentifierInvalid => "IDENTIFIER_INVALID",
            AppError::IdentifierTaken => "IDENTIFIER_TAKEN",
            AppError::WeakSecret(_) => "WEAK_SECRET",
            AppError::InviteRequired => "INVITE_REQUIRED",
            AppError::InviteInvalid => "INVITE_INVALID",
            AppError::InviteNotConfigured => "INVITE_NOT_CONFIGURED",
            AppError::Validation(_) => "VALIDATION_ERROR",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NoToken | AppError::BadToken | AppError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden | AppError::InviteRequired | AppError::InviteInvalid => {
                StatusCode::FORBIDDEN
            }
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::IdentifierTaken => StatusCode::CONFLICT,
            AppError::InviteNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RouteRequired
            | AppError::BadId
            | AppError::BadStatus
            | AppError::BadDirection
            | AppError::BadDistance
            | AppError::RoleInvalid
            | AppError::IdentifierInvalid
            | AppError::WeakSecret(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error code, e.g. `FORBIDDEN`
    pub error: String,
    /// Human-readable description
    pub message: String,
}

impl utoipa::ToSchema for AppError {
    fn name() -> std::borrow::Cow<'static, str> {
        "ErrorResponse".into()
    }
}

impl utoipa::PartialSchema for AppError {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ErrorResponse::schema()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "error": self.code(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
