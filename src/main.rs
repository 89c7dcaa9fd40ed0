use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tripdesk::{config, middleware, migration, routes, utils};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        tripdesk::handlers::auth::register,
        tripdesk::handlers::auth::login,
        tripdesk::handlers::auth::me,
        tripdesk::handlers::fleet::list_fleet,
        tripdesk::handlers::report::create_report,
        tripdesk::handlers::report::list_reports,
        tripdesk::handlers::report::update_status,
        tripdesk::handlers::report::delete_report,
    ),
    components(
        schemas(
            tripdesk::error::AppError,
            tripdesk::models::Role,
            tripdesk::models::Direction,
            tripdesk::models::ReportStatus,
            tripdesk::models::SubScores,
            // Auth
            tripdesk::handlers::auth::RegisterRequest,
            tripdesk::handlers::auth::LoginRequest,
            tripdesk::handlers::auth::AuthResponse,
            tripdesk::handlers::auth::MeResponse,
            tripdesk::handlers::auth::PrincipalResponse,
            // Fleet
            tripdesk::handlers::fleet::FleetResponse,
            tripdesk::handlers::fleet::FleetEntry,
            // Reports
            tripdesk::handlers::report::CreateReportRequest,
            tripdesk::handlers::report::UpdateStatusRequest,
            tripdesk::handlers::report::ReportResponse,
            tripdesk::handlers::report::CreateReportResponse,
            tripdesk::handlers::report::ReportListResponse,
            tripdesk::handlers::report::StatusUpdateResponse,
            tripdesk::handlers::report::DeleteReportResponse,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and identity"),
        (name = "fleet", description = "Vehicle and trailer reference data"),
        (name = "reports", description = "Trip report submission and review"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    // Validate configuration before doing anything else
    let (jwt_config, fleet) = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting trip report service v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let app = create_app()
        .layer(Extension(db))
        .layer(Extension(Arc::new(fleet)));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

fn init_tracing() {
    let json_logs = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripdesk=debug,tower_http=debug,axum=debug".into()),
        )
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<(config::jwt::JwtConfig, config::fleet::FleetCatalog)> {
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    let auth_config = config::auth::AuthConfig::from_env();
    if auth_config.reviewer_invite_code.is_none() {
        tracing::warn!("REVIEWER_INVITE_CODE not set, reviewer registration is disabled");
    }

    let fleet = config::fleet::FleetCatalog::from_env()?;
    tracing::info!("Fleet catalog loaded with {} vehicles", fleet.entries().count());

    Ok((jwt_config, fleet))
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app() -> Router {
    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(axum::middleware::from_fn(
            middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db.ping().await.is_ok();
    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Trip report service",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
