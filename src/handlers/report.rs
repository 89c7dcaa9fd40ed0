use crate::config::fleet::FleetCatalog;
use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::{Direction, ReportStatus, SubScores};
use crate::response::ApiResponse;
use crate::services::query::{ReportFilter, ReportView};
use crate::services::report::{NewReport, ReportService};
use axum::{body::Bytes, extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Also accepts the short field names used by older clients.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateReportRequest {
    /// LOADING (default) or UNLOADING
    #[serde(alias = "type")]
    pub direction: Option<String>,
    #[serde(default, alias = "from_city")]
    #[validate(length(max = 120))]
    pub origin_city: String,
    #[serde(default, alias = "to_city")]
    #[validate(length(max = 120))]
    pub destination_city: String,
    #[serde(alias = "cargo")]
    #[validate(length(max = 500))]
    pub cargo_description: Option<String>,
    #[serde(alias = "truck")]
    #[validate(length(max = 120))]
    pub vehicle: Option<String>,
    /// Filled from the fleet catalog when omitted
    #[validate(length(max = 120))]
    pub trailer: Option<String>,
    #[serde(alias = "km")]
    pub distance_km: Option<f64>,
    #[serde(alias = "date_from")]
    pub window_start: Option<NaiveDate>,
    #[serde(alias = "date_to")]
    pub window_end: Option<NaiveDate>,
    /// Client-computed rating, stored as supplied
    #[serde(alias = "score")]
    pub rating: Option<f64>,
    /// Used to derive the rating when `rating` is omitted
    pub sub_scores: Option<SubScores>,
    #[serde(alias = "note")]
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

impl From<CreateReportRequest> for NewReport {
    fn from(r: CreateReportRequest) -> Self {
        Self {
            direction: r.direction,
            origin_city: r.origin_city,
            destination_city: r.destination_city,
            cargo_description: r.cargo_description,
            vehicle: r.vehicle,
            trailer: r.trailer,
            distance_km: r.distance_km,
            window_start: r.window_start,
            window_end: r.window_end,
            rating: r.rating,
            sub_scores: r.sub_scores,
            comment: r.comment,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListReportsQuery {
    /// Case-insensitive search over cities, cargo, vehicle, comment and author
    pub q: Option<String>,
    /// LOADING, UNLOADING or ALL
    #[serde(rename = "type", alias = "direction")]
    pub direction: Option<String>,
    /// PENDING, APPROVED, REJECTED or ALL
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// PENDING, APPROVED or REJECTED
    #[serde(default)]
    #[schema(value_type = String, example = "APPROVED")]
    pub status: Option<serde_json::Value>,
}

impl UpdateStatusRequest {
    /// A missing, malformed or non-JSON body reads as an empty status. The service
    /// checks the caller's role before it looks at the status.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// Non-string values become empty and are rejected as `BAD_STATUS`.
    pub fn status(&self) -> &str {
        self.status
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .unwrap_or("")
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub id: i32,
    pub author_id: i32,
    pub author_name: String,
    pub direction: Direction,
    pub origin_city: String,
    pub destination_city: String,
    pub cargo_description: String,
    pub vehicle: String,
    pub trailer: String,
    pub distance_km: f64,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub rating: f64,
    pub comment: String,
    pub status: ReportStatus,
    /// RFC 3339, UTC
    pub created_at: String,
    /// RFC 3339, UTC
    pub updated_at: String,
}

impl From<ReportView> for ReportResponse {
    fn from(view: ReportView) -> Self {
        let r = view.report;
        Self {
            id: r.id,
            author_id: r.author_id,
            author_name: view.author_name,
            direction: r.direction,
            origin_city: r.origin_city,
            destination_city: r.destination_city,
            cargo_description: r.cargo_description,
            vehicle: r.vehicle,
            trailer: r.trailer,
            distance_km: r.distance_km,
            window_start: r.window_start,
            window_end: r.window_end,
            rating: r.rating,
            comment: r.comment,
            status: r.status,
            created_at: r.created_at.and_utc().to_rfc3339(),
            updated_at: r.updated_at.and_utc().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateReportResponse {
    pub report: ReportResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportListResponse {
    pub reports: Vec<ReportResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusUpdateResponse {
    pub ok: bool,
    pub report: ReportResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteReportResponse {
    pub ok: bool,
    /// Rows removed; 0 when the report did not exist
    pub changes: u64,
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    security(("jwt_token" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 200, description = "Report created", body = CreateReportResponse),
        (status = 400, description = "ROUTE_REQUIRED, BAD_DIRECTION or BAD_DISTANCE", body = AppError),
        (status = 401, description = "NO_TOKEN or BAD_TOKEN", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report(
    Extension(db): Extension<DatabaseConnection>,
    Extension(fleet): Extension<Arc<FleetCatalog>>,
    auth_user: AuthUser,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ReportService::new(db);
    let view = service
        .create_report(&auth_user, payload.into(), &fleet)
        .await?;

    Ok(ApiResponse::ok(CreateReportResponse {
        report: view.into(),
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports",
    security(("jwt_token" = [])),
    params(ListReportsQuery),
    responses(
        (status = 200, description = "Newest first, at most 500. Drivers only see their own.", body = ReportListResponse),
        (status = 401, description = "NO_TOKEN or BAD_TOKEN", body = AppError),
    ),
    tag = "reports"
)]
pub async fn list_reports(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(params): Query<ListReportsQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = ReportFilter::from_params(
        params.q.as_deref(),
        params.direction.as_deref(),
        params.status.as_deref(),
    );

    let service = ReportService::new(db);
    let reports = service.list_reports(&auth_user, filter).await?;

    Ok(ApiResponse::ok(ReportListResponse {
        reports: reports.into_iter().map(ReportResponse::from).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/reports/{id}/status",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Report ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = StatusUpdateResponse),
        (status = 400, description = "BAD_ID or BAD_STATUS", body = AppError),
        (status = 403, description = "Reviewer only", body = AppError),
        (status = 404, description = "NOT_FOUND", body = AppError),
    ),
    tag = "reports"
)]
pub async fn update_status(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let payload = UpdateStatusRequest::from_body(&body);

    let service = ReportService::new(db);
    let view = service
        .update_status(&auth_user, &id, payload.status())
        .await?;

    Ok(ApiResponse::ok(StatusUpdateResponse {
        ok: true,
        report: view.into(),
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reports/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Deleted, or already absent", body = DeleteReportResponse),
        (status = 400, description = "BAD_ID", body = AppError),
        (status = 403, description = "Reviewer only", body = AppError),
    ),
    tag = "reports"
)]
pub async fn delete_report(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = ReportService::new(db);
    let changes = service.delete_report(&auth_user, &id).await?;

    Ok(ApiResponse::ok(DeleteReportResponse { ok: true, changes }))
}
