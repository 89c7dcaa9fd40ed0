use super::parse_bool_env;
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

/// Per-IP limits for the credential endpoints and for the rest of the API.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub auth: RateLimitRule,
    pub api: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            api: RateLimitRule::new(20, 40),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.enabled = parse_bool_env("RATE_LIMIT_ENABLED", cfg.enabled);

        if let Ok(raw) = env::var("RATE_LIMIT_CONFIG") {
            if let Err(err) = cfg.apply(&raw) {
                tracing::warn!("Invalid RATE_LIMIT_CONFIG '{}': {}", raw, err);
            }
        }

        cfg
    }

    /// Accepts either a single `per:burst` rule for every group or a list such as
    /// `auth=5:10,api=20:40`. Nothing is applied unless the whole value parses.
    fn apply(&mut self, raw: &str) -> Result<(), String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err("empty value".to_string());
        }

        if !trimmed.contains('=') {
            let rule = parse_rule(trimmed)?;
            self.auth = rule;
            self.api = rule;
            return Ok(());
        }

        let mut next = *self;
        for item in trimmed.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            let (name, rule) = item
                .split_once('=')
                .ok_or_else(|| format!("invalid item '{}', expected name=per:burst", item))?;
            let rule = parse_rule(rule.trim())?;
            match name.trim().to_ascii_lowercase().as_str() {
                "auth" => next.auth = rule,
                "api" => next.api = rule,
                other => return Err(format!("unknown group '{}', expected auth/api", other)),
            }
        }
        *self = next;
        Ok(())
    }
}

fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per_second, burst) = raw
        .split_once(':')
        .ok_or_else(|| format!("invalid rule '{}', expected per:burst", raw))?;

    let per_second: u64 = per_second
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per_second.trim()))?;
    let burst_size: u32 = burst
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst_size '{}'", burst.trim()))?;

    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst_size must be > 0".to_string());
    }

    Ok(RateLimitRule::new(per_second, burst_size))
}
