use crate::{
    config::auth::AuthConfig,
    error::{AppError, AppResult},
    models::{principal, Principal, PrincipalModel, Role},
    utils::{encode_token, hash_password, secrets_match, verify_password},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    SqlErr,
};

const MIN_HANDLE_LEN: usize = 3;
const MAX_HANDLE_LEN: usize = 50;

/// Everything a caller supplies to register. Role and invite code arrive as raw
/// strings so that a bad role surfaces as `ROLE_INVALID` rather than a body rejection.
#[derive(Debug, Clone, Copy)]
pub struct Registration<'a> {
    pub display_name: &'a str,
    pub password: &'a str,
    pub role: &'a str,
    pub invite_code: Option<&'a str>,
    pub contact: Option<&'a str>,
}

pub struct AuthService {
    db: DatabaseConnection,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, AuthConfig::from_env())
    }

    pub fn with_config(db: DatabaseConnection, config: AuthConfig) -> Self {
        Self { db, config }
    }

    /// Register a principal and issue its first token.
    /// Every check runs before the principal row is written.
    pub async fn register(&self, input: Registration<'_>) -> AppResult<(PrincipalModel, String)> {
        let role: Role = input.role.parse()?;
        if role == Role::Reviewer {
            self.check_invite(input.invite_code)?;
        }

        let display_name = input.display_name.trim();
        let handle_len = display_name.chars().count();
        if !(MIN_HANDLE_LEN..=MAX_HANDLE_LEN).contains(&handle_len) {
            return Err(AppError::IdentifierInvalid);
        }
        if input.password.chars().count() < self.config.min_password_length {
            return Err(AppError::WeakSecret(self.config.min_password_length));
        }
        if self.handle_exists(display_name).await? {
            return Err(AppError::IdentifierTaken);
        }

        let password_hash = hash_password(input.password)?;
        let contact = input
            .contact
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        let new_principal = principal::ActiveModel {
            display_name: sea_orm::ActiveValue::Set(display_name.to_string()),
            contact: sea_orm::ActiveValue::Set(contact),
            role: sea_orm::ActiveValue::Set(role),
            password_hash: sea_orm::ActiveValue::Set(password_hash),
            created_at: sea_orm::ActiveValue::Set(chrono::Utc::now().naive_utc()),
            ..Default::default()
        };

        // The unique index settles races between two registrations of the same handle.
        let principal = new_principal
            .insert(&self.db)
            .await
            .map_err(|e| match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => AppError::IdentifierTaken,
                _ => AppError::Database(e),
            })?;
        let token = encode_token(&principal)?;

        tracing::info!(principal_id = principal.id, role = %principal.role, "principal registered");
        Ok((principal, token))
    }

    /// Login principal
    /// Returns (principal, token)
    pub async fn login(
        &self,
        display_name: &str,
        password: &str,
    ) -> AppResult<(PrincipalModel, String)> {
        let principal = Principal::find()
            .filter(principal::Column::DisplayName.eq(display_name.trim()))
            .one(&self.db)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &principal.password_hash)? {
            return Err(AppError::InvalidCredentials);
        }

        let token = encode_token(&principal)?;
        Ok((principal, token))
    }

    pub async fn find_principal(&self, id: i32) -> AppResult<Option<PrincipalModel>> {
        Ok(Principal::find_by_id(id).one(&self.db).await?)
    }

    fn check_invite(&self, supplied: Option<&str>) -> AppResult<()> {
        let expected = self
            .config
            .reviewer_invite_code
            .as_deref()
            .ok_or(AppError::InviteNotConfigured)?;
        let supplied = supplied
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(AppError::InviteRequired)?;

        if !secrets_match(expected, supplied) {
            tracing::warn!("reviewer registration with a wrong invite code");
            return Err(AppError::InviteInvalid);
        }
        Ok(())
    }

    async fn handle_exists(&self, display_name: &str) -> AppResult<bool> {
        let count = Principal::find()
            .filter(principal::Column::DisplayName.eq(display_name))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }
}
