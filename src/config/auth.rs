use std::env;

const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

/// Registration rules. The invite code is the only gate on the reviewer role.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub reviewer_invite_code: Option<String>,
    pub min_password_length: usize,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let reviewer_invite_code = env::var("REVIEWER_INVITE_CODE")
            .ok()
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty());

        let min_password_length = env::var("MIN_PASSWORD_LENGTH")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .filter(|len: &usize| *len > 0)
            .unwrap_or(DEFAULT_MIN_PASSWORD_LENGTH);

        Self {
            reviewer_invite_code,
            min_password_length,
        }
    }
}
