#![allow(dead_code)]

use reqwest::Client;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Once,
};

pub const INVITE_CODE: &str = "integration-invite-code";
pub const PASSWORD: &str = "test_password_123";

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("REVIEWER_INVITE_CODE", INVITE_CODE);
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        std::env::remove_var("MIN_PASSWORD_LENGTH");
        let config = tripdesk::config::jwt::JwtConfig::from_env().unwrap();
        let _ = tripdesk::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

/// Every call gets its own in-memory database, so tests never see each other's rows.
pub async fn spawn_app() -> TestApp {
    init_env();

    let db = tripdesk::config::database::connect("sqlite::memory:", 1, 1)
        .await
        .expect("Failed to open in-memory database");
    tripdesk::migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(tripdesk::routes::create_routes())
        .layer(axum::middleware::from_fn(
            tripdesk::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(Arc::new(
            tripdesk::config::fleet::FleetCatalog::default(),
        )));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
    }
}

pub fn unique_name(prefix: &str) -> String {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}_{}", prefix, counter)
}

/// Register a principal and return (id, token).
pub async fn register(app: &TestApp, name: &str, role: &str) -> (i64, String) {
    let mut body = serde_json::json!({
        "display_name": name,
        "password": PASSWORD,
        "role": role,
    });
    if role == "REVIEWER" {
        body["invite_code"] = Value::from(INVITE_CODE);
    }

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&body)
        .send()
        .await
        .expect("Failed to register");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse register response");
    assert_eq!(status, 200, "register {name} failed: {body}");

    let id = body["data"]["principal"]["id"]
        .as_i64()
        .expect("Response missing principal id");
    let token = body["data"]["token"]
        .as_str()
        .expect("Response missing token")
        .to_string();
    (id, token)
}

pub async fn create_driver(app: &TestApp, prefix: &str) -> (i64, String) {
    register(app, &unique_name(prefix), "DRIVER").await
}

pub async fn create_reviewer(app: &TestApp, prefix: &str) -> (i64, String) {
    register(app, &unique_name(prefix), "REVIEWER").await
}

/// Create a report and return its JSON representation.
pub async fn create_report(app: &TestApp, token: &str, body: Value) -> Value {
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Failed to create report");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse report response");
    assert_eq!(status, 200, "create report failed: {body}");
    body["data"]["report"].clone()
}

pub async fn create_route(app: &TestApp, token: &str, from: &str, to: &str) -> Value {
    create_report(
        app,
        token,
        serde_json::json!({ "origin_city": from, "destination_city": to }),
    )
    .await
}

/// List reports with an optional query string such as `"?status=APPROVED"`.
pub async fn list_reports(app: &TestApp, token: &str, query: &str) -> Vec<Value> {
    let resp = app
        .client
        .get(app.url(&format!("/reports{}", query)))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to list reports");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse list response");
    assert_eq!(status, 200, "list reports failed: {body}");
    body["data"]["reports"]
        .as_array()
        .expect("Response missing reports array")
        .clone()
}

pub fn ids(reports: &[Value]) -> Vec<i64> {
    reports.iter().filter_map(|r| r["id"].as_i64()).collect()
}

/// PATCH a status and return (http status, body).
pub async fn set_status(app: &TestApp, token: &str, id: &str, status: &str) -> (u16, Value) {
    let resp = app
        .client
        .patch(app.url(&format!("/reports/{}/status", id)))
        .bearer_auth(token)
        .json(&serde_json::json!({ "status": status }))
        .send()
        .await
        .expect("Failed to update status");

    let code = resp.status().as_u16();
    let body: Value = resp.json().await.expect("Failed to parse status response");
    (code, body)
}

/// DELETE a report and return (http status, body).
pub async fn delete_report(app: &TestApp, token: &str, id: &str) -> (u16, Value) {
    let resp = app
        .client
        .delete(app.url(&format!("/reports/{}", id)))
        .bearer_auth(token)
        .send()
        .await
        .expect("Failed to delete report");

    let code = resp.status().as_u16();
    let body: Value = resp.json().await.expect("Failed to parse delete response");
    (code, body)
}
