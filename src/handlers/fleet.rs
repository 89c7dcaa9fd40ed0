use crate::config::fleet::FleetCatalog;
use crate::response::ApiResponse;
use axum::{response::IntoResponse, Extension};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct FleetEntry {
    pub vehicle: String,
    pub trailer: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FleetResponse {
    pub vehicles: Vec<FleetEntry>,
}

#[utoipa::path(
    get,
    path = "/api/v1/fleet",
    responses(
        (status = 200, description = "Known vehicles and their default trailers", body = FleetResponse),
    ),
    tag = "fleet"
)]
pub async fn list_fleet(Extension(fleet): Extension<Arc<FleetCatalog>>) -> impl IntoResponse {
    let vehicles = fleet
        .entries()
        .map(|(vehicle, trailer)| FleetEntry {
            vehicle: vehicle.to_string(),
            trailer: trailer.to_string(),
        })
        .collect();

    ApiResponse::ok(FleetResponse { vehicles })
}
