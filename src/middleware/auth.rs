use crate::{error::AppError, models::Role, services::auth::AuthService, utils::jwt::decode_token};
use axum::{
    extract::{FromRequestParts, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// The principal behind the bearer token, as currently stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthUser {
    pub id: i32,
    pub display_name: String,
    pub role: Role,
}

/// JWT authentication middleware
///
/// A missing token is `NO_TOKEN`. A token that fails verification, or whose principal
/// no longer exists, is `BAD_TOKEN`. Role is taken from the store, not the claims.
pub async fn auth_middleware(
    Extension(db): Extension<DatabaseConnection>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(&headers).ok_or(AppError::NoToken)?;

    let claims = decode_token(&token).map_err(|e| {
        tracing::debug!("rejected token: {e:#}");
        AppError::BadToken
    })?;
    let principal_id = claims.principal_id().ok_or(AppError::BadToken)?;

    let principal = AuthService::new(db)
        .find_principal(principal_id)
        .await?
        .ok_or(AppError::BadToken)?;

    request.extensions_mut().insert(AuthUser {
        id: principal.id,
        display_name: principal.display_name,
        role: principal.role,
    });

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())?;

    let token = auth_header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::NoToken)
    }
}
