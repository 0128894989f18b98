// src/profile/handlers/employment.rs

use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::super::models::{CreateEmploymentRequest, EmploymentHistory, UpdateEmploymentRequest};
use super::super::validators::EmploymentValidator;
use crate::auth::AuthedUser;
use crate::common::{generate_employment_id, ApiError, AppState, JsonBody, Validator};

async fn list_for(pool: &SqlitePool, applicant_id: &str) -> Result<Vec<EmploymentHistory>, ApiError> {
    sqlx::query_as::<_, EmploymentHistory>(
        "SELECT * FROM employment_history WHERE applicant_id = ? ORDER BY start_date DESC, created_at DESC",
    )
    .bind(applicant_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        error!(error = %e, applicant_id = %applicant_id, "Database error fetching employment history");
        ApiError::DatabaseError(e)
    })
}

fn history_response(entries: Vec<EmploymentHistory>) -> Json<Value> {
    Json(json!({ "success": true, "employment_history": entries }))
}

/// GET /api/job/applicant/employment-history
pub async fn list_employment_history(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();

    let entries = list_for(&state.db, &authed.id).await?;
    debug!(applicant_id = %authed.id, count = entries.len(), "Fetched employment history");

    Ok(history_response(entries))
}

/// POST /api/job/applicant/employment-history
///
/// # Request Body
/// ```json
/// {
///   "job_title": "Backend Engineer",
///   "company_name": "Acme",
///   "company_logo": "https://cdn.example.com/acme.png",
///   "employment_type": "Full Time",
///   "start_date": "2021-02-01",
///   "end_date": "2023-06-30",
///   "description": "Payments team"
/// }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "employment_history": [ { "id": "EH_...", ... } ] }
/// ```
pub async fn add_employment_history(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<CreateEmploymentRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authed.require_applicant()?;

    let validation = EmploymentValidator.validate(&request);
    if !validation.is_valid {
        warn!(
            applicant_id = %authed.id,
            errors = ?validation.errors,
            "Employment history validation failed"
        );
        return Err(ApiError::from(validation));
    }

    let state = state_lock.read().await.clone();
    let entry_id = generate_employment_id();

    sqlx::query(
        r#"
        INSERT INTO employment_history (id, applicant_id, job_title, company_logo, company_name,
                                        employment_type, start_date, end_date, description)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry_id)
    .bind(&authed.id)
    .bind(request.job_title.trim())
    .bind(request.company_logo.as_deref())
    .bind(request.company_name.trim())
    .bind(request.employment_type.trim())
    .bind(request.start_date.trim())
    .bind(request.end_date.as_deref().map(str::trim))
    .bind(request.description.as_deref())
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, applicant_id = %authed.id, "Database error adding employment history");
        ApiError::DatabaseError(e)
    })?;

    info!(
        applicant_id = %authed.id,
        entry_id = %entry_id,
        company = %request.company_name,
        "Employment history added"
    );

    let entries = list_for(&state.db, &authed.id).await?;
    Ok((StatusCode::CREATED, history_response(entries)))
}

/// PATCH /api/job/applicant/employment-history/:id
/// Updates one entry in place; the entry keeps its id
pub async fn update_employment_history(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(entry_id): Path<String>,
    JsonBody(request): JsonBody<UpdateEmploymentRequest>,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    EmploymentValidator.validate(&request).into_api_result()?;

    let state = state_lock.read().await.clone();

    let existing = sqlx::query_as::<_, EmploymentHistory>(
        "SELECT * FROM employment_history WHERE id = ? AND applicant_id = ?",
    )
    .bind(&entry_id)
    .bind(&authed.id)
    .fetch_optional(&state.db)
    .await
    .map_err(ApiError::DatabaseError)?
    .ok_or_else(|| {
        warn!(applicant_id = %authed.id, entry_id = %entry_id, "Employment history entry not found");
        ApiError::NotFound("Updating employment history failed: Employment history not found.".to_string())
    })?;

    // The merged date range must still be ordered
    let start = request.start_date.as_deref().unwrap_or(&existing.start_date);
    let end = request.end_date.as_deref().or(existing.end_date.as_deref());
    if let Some(end) = end {
        if let (Ok(start), Ok(end)) = (
            NaiveDate::parse_from_str(start.trim(), "%Y-%m-%d"),
            NaiveDate::parse_from_str(end.trim(), "%Y-%m-%d"),
        ) {
            if end < start {
                return Err(ApiError::ValidationError(
                    "end_date: must be after start_date".to_string(),
                ));
            }
        }
    }

    sqlx::query(
        r#"
        UPDATE employment_history
        SET job_title = COALESCE(?, job_title),
            company_logo = COALESCE(?, company_logo),
            company_name = COALESCE(?, company_name),
            employment_type = COALESCE(?, employment_type),
            start_date = COALESCE(?, start_date),
            end_date = COALESCE(?, end_date),
            description = COALESCE(?, description),
            updated_at = datetime('now')
        WHERE id = ? AND applicant_id = ?
        "#,
    )
    .bind(request.job_title.as_deref().map(str::trim))
    .bind(request.company_logo.as_deref())
    .bind(request.company_name.as_deref().map(str::trim))
    .bind(request.employment_type.as_deref().map(str::trim))
    .bind(request.start_date.as_deref().map(str::trim))
    .bind(request.end_date.as_deref().map(str::trim))
    .bind(request.description.as_deref())
    .bind(&entry_id)
    .bind(&authed.id)
    .execute(&state.db)
    .await
    .map_err(|e| {
        error!(error = %e, entry_id = %entry_id, "Database error updating employment history");
        ApiError::DatabaseError(e)
    })?;

    info!(applicant_id = %authed.id, entry_id = %entry_id, "Employment history updated");

    let entries = list_for(&state.db, &authed.id).await?;
    Ok(history_response(entries))
}

/// DELETE /api/job/applicant/employment-history/:id
pub async fn delete_employment_history(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(entry_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();

    let result = sqlx::query("DELETE FROM employment_history WHERE id = ? AND applicant_id = ?")
        .bind(&entry_id)
        .bind(&authed.id)
        .execute(&state.db)
        .await
        .map_err(|e| {
            error!(error = %e, entry_id = %entry_id, "Database error deleting employment history");
            ApiError::DatabaseError(e)
        })?;

    if result.rows_affected() == 0 {
        warn!(applicant_id = %authed.id, entry_id = %entry_id, "Employment history entry not found");
        return Err(ApiError::NotFound(
            "Deleting employment history failed: Employment history not found.".to_string(),
        ));
    }

    info!(applicant_id = %authed.id, entry_id = %entry_id, "Employment history deleted");

    let entries = list_for(&state.db, &authed.id).await?;
    Ok(history_response(entries))
}
