// src/decals/routes.rs

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

pub fn decal_routes() -> Router {
    Router::new()
        .route("/api/decal/create", post(handlers::create_decal))
        .route("/api/decal/scan", post(handlers::scan_decal))
        .route("/api/decal/:decal_id/scans", get(handlers::list_scans))
}
