use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::config::jwt::JwtConfig;
use crate::models::{PrincipalModel, Role};

static JWT_CONFIG: OnceLock<JwtConfig> = OnceLock::new();

/// Initialize JWT config from environment. Must be called once at startup.
pub fn init_jwt_config(config: JwtConfig) -> Result<()> {
    JWT_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("JWT config already initialized"))?;
    Ok(())
}

fn get_config() -> Result<&'static JwtConfig> {
    JWT_CONFIG
        .get()
        .context("JWT config not initialized; call init_jwt_config() at startup")
}

/// Identity carried by a token. The store stays authoritative: the auth middleware
/// re-reads the principal behind `sub` on every request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub name: String,
    pub role: Role,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn principal_id(&self) -> Option<i32> {
        self.sub.parse().ok().filter(|id| *id > 0)
    }
}

pub fn encode_token(principal: &PrincipalModel) -> Result<String> {
    let config = get_config()?;
    let now = chrono::Utc::now().timestamp().max(0) as usize;
    let claims = Claims {
        sub: principal.id.to_string(),
        name: principal.display_name.clone(),
        role: principal.role,
        exp: now + config.token_expiry as usize,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .context("Failed to encode access token")
}

pub fn decode_token(token: &str) -> Result<Claims> {
    let config = get_config()?;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .context("Failed to decode JWT")
}
