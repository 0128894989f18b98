// src/jobs/handlers/employer.rs

use axum::{
    extract::{Extension, Json, Path, Query},
    http::StatusCode,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::auth::{auth_failure, AuthedUser};
use crate::common::{ApiError, AppState, JsonBody, Validator};
use crate::jobs::models::*;
use crate::jobs::services::JobStore;
use crate::jobs::validators::JobPostValidator;
use crate::services::credentials::Employer;

/// Current company name of the caller, copied onto every post they write
async fn employer_for(state: &AppState, employer_id: &str, action: &str) -> Result<Employer, ApiError> {
    state
        .auth
        .employer_public(employer_id)
        .await
        .map_err(|e| auth_failure(action, e))
}

/// POST /api/job/employer/create
///
/// # Request Body
/// ```json
/// {
///   "job_title": "Barista",
///   "job_address": "1 George St, Sydney",
///   "location": [151.2093, -33.8688],
///   "summary": "Morning shifts",
///   "key_responsibilities": ["Coffee"],
///   "qualifications": ["RSA"],
///   "closing_statement": "Apply today",
///   "salary_min": 28.5,
///   "salary_max": 32.0,
///   "salary_currency": "AUD",
///   "salary_period": "Hourly",
///   "work_type": "Onsite",
///   "employment_type": "Part Time",
///   "seniority": "Junior"
/// }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "job": { "id": "J_...", "company_name": "Acme", ... } }
/// ```
pub async fn create_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(post): JsonBody<CreateJobPost>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authed.require_employer()?;

    let validation = JobPostValidator.validate(&post);
    if !validation.is_valid {
        warn!(
            employer_id = %authed.id,
            errors = ?validation.errors,
            "Job post validation failed"
        );
        return Err(ApiError::from(validation));
    }

    let state = state_lock.read().await.clone();
    let employer = employer_for(&state, &authed.id, "Job creation failed").await?;

    let row = JobStore::new(state.db.clone())
        .create(&authed.id, &employer.company_name, &post)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "job": JobPost::from(row) })),
    ))
}

/// GET /api/job/employer/get/all?page=1
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "jobs": [ ... ],
///   "pagination": { "total": 12, "page": 1, "totalPages": 2, "hasNextPage": true, "hasPrevPage": false }
/// }
/// ```
pub async fn list_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    authed.require_employer()?;
    let state = state_lock.read().await.clone();
    let page = query.page();

    let (rows, total) = JobStore::new(state.db.clone())
        .list_for_employer(&authed.id, page)
        .await?;

    let pagination = Pagination::new(total, page, rows.len());
    let jobs: Vec<JobPost> = rows.into_iter().map(JobPost::from).collect();

    debug!(employer_id = %authed.id, page, count = jobs.len(), "Fetched employer jobs");

    Ok(Json(json!({
        "success": true,
        "jobs": jobs,
        "pagination": pagination
    })))
}

/// GET /api/job/employer/get/:id
/// The post with application counts and every application's applicant
pub async fn get_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    authed.require_employer()?;
    let state = state_lock.read().await.clone();
    let store = JobStore::new(state.db.clone());

    let row = store.find_owned_job(&job_id, &authed.id).await?.ok_or_else(|| {
        warn!(employer_id = %authed.id, job_id = %job_id, "Job not found for employer");
        ApiError::NotFound("Fetching job failed: Job not found".to_string())
    })?;

    let credentials = state.auth.credentials();
    let employer = credentials
        .find_employer_by_id(&row.employer_id)
        .await
        .map_err(|e| auth_failure("Fetching job failed", e.into()))?
        .map(Employer::from);

    let application_stats = store.application_stats(&job_id).await?;

    let mut applications = Vec::new();
    for application in store.applications_for(&job_id).await? {
        let applicant = credentials
            .find_applicant_by_id(&application.applicant_id)
            .await
            .map_err(|e| auth_failure("Fetching job failed", e.into()))?
            .map(Into::into);
        applications.push(ApplicationWithApplicant {
            application,
            applicant,
        });
    }

    let view = EmployerJobView {
        job: row.into(),
        employer,
        application_stats,
        applications,
    };

    Ok(Json(json!({ "success": true, "job": view })))
}

/// PATCH /api/job/employer/update/:id
/// Partial update; the company name is refreshed from the employer profile
pub async fn update_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(job_id): Path<String>,
    JsonBody(update): JsonBody<UpdateJobPost>,
) -> Result<Json<Value>, ApiError> {
    authed.require_employer()?;
    JobPostValidator.validate(&update).into_api_result()?;

    let state = state_lock.read().await.clone();
    let employer = employer_for(&state, &authed.id, "Job update failed").await?;

    let row = JobStore::new(state.db.clone())
        .update(&job_id, &authed.id, &employer.company_name, &update)
        .await?
        .ok_or_else(|| {
            warn!(employer_id = %authed.id, job_id = %job_id, "Job to update not found");
            ApiError::NotFound("Job update failed: Job not found".to_string())
        })?;

    info!(employer_id = %authed.id, job_id = %job_id, "Job post updated");

    Ok(Json(json!({ "success": true, "job": JobPost::from(row) })))
}

/// DELETE /api/job/employer/delete/:id
///
/// # Response
/// ```json
/// { "success": true, "message": "Job deleted successfully" }
/// ```
pub async fn delete_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    authed.require_employer()?;
    let state = state_lock.read().await.clone();

    let deleted = JobStore::new(state.db.clone())
        .delete(&job_id, &authed.id)
        .await?;

    if !deleted {
        warn!(employer_id = %authed.id, job_id = %job_id, "Job to delete not found");
        return Err(ApiError::NotFound(
            "Job deletion failed: Job not found".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Job deleted successfully"
    })))
}
