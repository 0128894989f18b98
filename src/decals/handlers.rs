// src/decals/handlers.rs

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::models::*;
use super::validators::{CreateDecalValidator, ScanDecalValidator};
use crate::auth::AuthedUser;
use crate::common::{generate_decal_id, generate_decal_scan_id, ApiError, AppState, JsonBody, Validator};

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> ApiError {
    move |e| {
        error!(error = %e, "Database error {}", context);
        ApiError::DatabaseError(e)
    }
}

async fn find_decal(pool: &SqlitePool, decal_id: &str) -> Result<Option<Decal>, ApiError> {
    sqlx::query_as::<_, Decal>("SELECT * FROM decals WHERE id = ?")
        .bind(decal_id)
        .fetch_optional(pool)
        .await
        .map_err(db_error("fetching decal"))
}

/// POST /api/decal/create
///
/// # Request Body
/// ```json
/// { "nfcTagId": "04:A2:19:7C:33:5E:80" }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "decal": { "id": "D_...", "employer_id": "EM_...", "nfc_tag_id": "04:A2:19:7C:33:5E:80" } }
/// ```
pub async fn create_decal(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<CreateDecalRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authed.require_employer()?;
    CreateDecalValidator.validate(&request).into_api_result()?;

    let state = state_lock.read().await.clone();
    let decal_id = generate_decal_id();
    let nfc_tag_id = request.nfc_tag_id.trim();

    let inserted = sqlx::query("INSERT INTO decals (id, employer_id, nfc_tag_id) VALUES (?, ?, ?)")
        .bind(&decal_id)
        .bind(&authed.id)
        .bind(nfc_tag_id)
        .execute(&state.db)
        .await;

    if let Err(e) = inserted {
        if e.as_database_error().is_some_and(|db| db.is_unique_violation()) {
            warn!(employer_id = %authed.id, nfc_tag_id = %nfc_tag_id, "NFC tag already registered");
            return Err(ApiError::BadRequest(
                "Decal creation failed: NFC tag is already registered".to_string(),
            ));
        }
        return Err(db_error("creating decal")(e));
    }

    let decal = find_decal(&state.db, &decal_id)
        .await?
        .ok_or_else(|| ApiError::InternalServer("Decal creation failed".to_string()))?;

    info!(employer_id = %authed.id, decal_id = %decal.id, "Decal created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "decal": decal })),
    ))
}

/// POST /api/decal/scan
/// Records that the calling applicant tapped a decal. Every tap is a new scan.
///
/// # Request Body
/// ```json
/// { "decalId": "D_K7NP3X" }
/// ```
pub async fn scan_decal(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<ScanDecalRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authed.require_applicant()?;
    ScanDecalValidator.validate(&request).into_api_result()?;

    let state = state_lock.read().await.clone();
    let decal_id = request.decal_id.trim();

    if find_decal(&state.db, decal_id).await?.is_none() {
        warn!(applicant_id = %authed.id, decal_id = %decal_id, "Scanned decal not found");
        return Err(ApiError::NotFound(
            "Decal scanning failed: Decal not found".to_string(),
        ));
    }

    let scan = DecalScan {
        id: generate_decal_scan_id(),
        decal_id: decal_id.to_string(),
        applicant_id: authed.id.clone(),
        scanned_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    };

    sqlx::query(
        "INSERT INTO decal_scans (id, decal_id, applicant_id, scanned_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&scan.id)
    .bind(&scan.decal_id)
    .bind(&scan.applicant_id)
    .bind(&scan.scanned_at)
    .execute(&state.db)
    .await
    .map_err(db_error("recording decal scan"))?;

    debug!(applicant_id = %authed.id, decal_id = %decal_id, "Decal scanned");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "scan": scan })),
    ))
}

/// GET /api/decal/:decal_id/scans
/// Scans of one of the caller's decals, newest first
///
/// # Response
/// ```json
/// { "success": true, "scans": [ { "id": "DS_...", "decal_id": "D_...", "applicant_id": "AP_...", "scanned_at": "..." } ] }
/// ```
pub async fn list_scans(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(decal_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    authed.require_employer()?;
    let state = state_lock.read().await.clone();

    let owned = find_decal(&state.db, &decal_id)
        .await?
        .filter(|decal| decal.employer_id == authed.id);
    if owned.is_none() {
        return Err(ApiError::NotFound(
            "Failed to retrieve scans: Decal not found".to_string(),
        ));
    }

    let scans = sqlx::query_as::<_, DecalScan>(
        "SELECT * FROM decal_scans WHERE decal_id = ? ORDER BY scanned_at DESC, rowid DESC",
    )
    .bind(&decal_id)
    .fetch_all(&state.db)
    .await
    .map_err(db_error("fetching decal scans"))?;

    Ok(Json(json!({ "success": true, "scans": scans })))
}
