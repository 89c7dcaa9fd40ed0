use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public = public_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public).merge(protected)
}

/// Credential endpoints: register, login.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login));

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Reference data that needs no identity.
fn public_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new().route("/fleet", routing::get(handlers::fleet::list_fleet));

    with_optional_rate_limit(router, config.enabled, config.api)
}

/// Everything that needs a bearer token. Role checks happen in the report service.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/me", routing::get(handlers::me))
        .route(
            "/reports",
            routing::get(handlers::report::list_reports).post(handlers::report::create_report),
        )
        .route(
            "/reports/{id}",
            routing::delete(handlers::report::delete_report),
        )
        .route(
            "/reports/{id}/status",
            routing::patch(handlers::report::update_status),
        );

    with_optional_rate_limit(router, config.enabled, config.api)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    match GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    {
        Some(governor_conf) => router.layer(GovernorLayer::new(governor_conf)),
        None => {
            tracing::warn!(?rule, "invalid rate limit rule, serving without a limit");
            router
        }
    }
}
