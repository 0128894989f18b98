// src/jobs/handlers/applicant.rs

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
use crate::jobs::services::geo::{haversine_distance, BoundingBox};
use crate::jobs::services::matching::{heading_keywords, rank_by_keywords};
use crate::jobs::services::JobStore;
use crate::jobs::validators::{DistanceValidator, JobIdValidator, SearchValidator};

const RECOMMENDATION_LIMIT: usize = 10;

/// Attaches the caller's `isSaved` flag to each post
async fn listings(
    store: &JobStore,
    applicant_id: &str,
    rows: Vec<JobPostRow>,
) -> Result<Vec<JobListing>, ApiError> {
    let saved = store.saved_job_ids(applicant_id).await?;
    Ok(rows
        .into_iter()
        .map(|row| JobListing {
            is_saved: saved.contains(&row.id),
            job: row.into(),
        })
        .collect())
}

fn jobs_response(jobs: Vec<JobListing>) -> Json<Value> {
    Json(json!({ "success": true, "jobs": jobs }))
}

// ============================================================================
// Discovery
// ============================================================================

/// POST /api/job/applicant/map/distance
///
/// # Request Body
/// ```json
/// { "latitude": -33.8688, "longitude": 151.2093, "maxDistance": 5000 }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "jobs": [ { "id": "J_...", "isSaved": false, ... } ] }
/// ```
pub async fn jobs_by_distance(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<DistanceRequest>,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    DistanceValidator.validate(&request).into_api_result()?;

    let (Some(lat), Some(lng), Some(max_distance)) =
        (request.latitude, request.longitude, request.max_distance)
    else {
        return Err(ApiError::ValidationError(
            "latitude, longitude and maxDistance are required".to_string(),
        ));
    };

    let state = state_lock.read().await.clone();
    let store = JobStore::new(state.db.clone());
    let center = [lng, lat];

    let candidates = store.within_box(BoundingBox::around(center, max_distance)).await?;
    let nearby: Vec<JobPostRow> = candidates
        .into_iter()
        .filter(|row| haversine_distance(center, [row.location_lng, row.location_lat]) <= max_distance)
        .collect();

    debug!(
        applicant_id = %authed.id,
        max_distance,
        count = nearby.len(),
        "Fetched jobs by distance"
    );

    Ok(jobs_response(listings(&store, &authed.id, nearby).await?))
}

/// GET /api/job/applicant/search?title=barista&isFinalSearch=true
/// A final search is also written to the caller's search history
pub async fn search_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    SearchValidator.validate(&query).into_api_result()?;

    let state = state_lock.read().await.clone();
    let store = JobStore::new(state.db.clone());

    let rows = store.search_title(&query.title).await?;
    if query.is_final_search {
        store.record_search(&authed.id, &query.title).await?;
    }

    debug!(
        applicant_id = %authed.id,
        query = %query.title,
        final_search = query.is_final_search,
        count = rows.len(),
        "Searched jobs"
    );

    Ok(jobs_response(listings(&store, &authed.id, rows).await?))
}

/// GET /api/job/applicant/search/history
///
/// # Response
/// ```json
/// { "success": true, "searches": [ { "id": "Q_...", "query": "barista", "created_at": "..." } ] }
/// ```
pub async fn search_history(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();

    let searches = JobStore::new(state.db.clone())
        .recent_searches(&authed.id)
        .await?;

    Ok(Json(json!({ "success": true, "searches": searches })))
}

/// GET /api/job/applicant/popular
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "jobs": [
///     { "popularityStats": { "applicationCount": 3, "lastUpdated": "..." }, "jobDetails": { ... } }
///   ]
/// }
/// ```
pub async fn popular_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();
    let store = JobStore::new(state.db.clone());

    let saved = store.saved_job_ids(&authed.id).await?;
    let jobs: Vec<PopularJob> = store
        .popular()
        .await?
        .into_iter()
        .map(|row| PopularJob {
            popularity_stats: PopularityStats {
                application_count: row.application_count,
                last_updated: row.last_updated,
            },
            job_details: JobListing {
                is_saved: saved.contains(&row.job.id),
                job: row.job.into(),
            },
        })
        .collect();

    Ok(Json(json!({ "success": true, "jobs": jobs })))
}

/// GET /api/job/applicant/recent
pub async fn recent_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();
    let store = JobStore::new(state.db.clone());

    let rows = store.recent().await?;
    Ok(jobs_response(listings(&store, &authed.id, rows).await?))
}

/// GET /api/job/applicant/recommended
/// Up to ten posts whose titles share words with the caller's heading
pub async fn recommended_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();

    let applicant = state
        .auth
        .credentials()
        .find_applicant_by_id(&authed.id)
        .await
        .map_err(|e| auth_failure("Failed to get recommended jobs", e.into()))?
        .ok_or_else(|| {
            ApiError::NotFound("Failed to get recommended jobs: Applicant not found".to_string())
        })?;

    let heading = applicant
        .heading
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| {
            warn!(applicant_id = %authed.id, "Recommendations requested without a heading");
            ApiError::BadRequest(
                "Failed to get recommended jobs: Applicant heading not found".to_string(),
            )
        })?;

    let keywords = heading_keywords(heading);
    let store = JobStore::new(state.db.clone());
    let ranked = rank_by_keywords(
        store.all_jobs().await?,
        &keywords,
        |row: &JobPostRow| row.job_title.as_str(),
        RECOMMENDATION_LIMIT,
    );

    debug!(
        applicant_id = %authed.id,
        keywords = ?keywords,
        count = ranked.len(),
        "Computed job recommendations"
    );

    Ok(jobs_response(listings(&store, &authed.id, ranked).await?))
}

/// GET /api/job/applicant/job/:id
///
/// # Response
/// ```json
/// { "success": true, "job": { "id": "J_...", "employer": { ... }, "isSaved": true, "isApplied": false } }
/// ```
pub async fn get_job_for_applicant(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();
    let store = JobStore::new(state.db.clone());

    let row = store.find_job(&job_id).await?.ok_or_else(|| {
        ApiError::NotFound("Fetching job failed: Job not found".to_string())
    })?;

    let employer = state
        .auth
        .credentials()
        .find_employer_by_id(&row.employer_id)
        .await
        .map_err(|e| auth_failure("Fetching job failed", e.into()))?
        .map(Into::into);

    let view = ApplicantJobView {
        is_saved: store.saved_job_ids(&authed.id).await?.contains(&row.id),
        is_applied: store.is_applied(&authed.id, &row.id).await?,
        employer,
        job: row.into(),
    };

    Ok(Json(json!({ "success": true, "job": view })))
}

// ============================================================================
// Applications
// ============================================================================

/// POST /api/job/applicant/apply
///
/// # Request Body
/// ```json
/// { "jobId": "J_..." }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "application": { "id": "A_...", "status": "Pending", ... } }
/// ```
pub async fn apply_to_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<JobIdRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    authed.require_applicant()?;
    JobIdValidator.validate(&request).into_api_result()?;

    let state = state_lock.read().await.clone();
    let store = JobStore::new(state.db.clone());

    if store.find_job(&request.job_id).await?.is_none() {
        warn!(applicant_id = %authed.id, job_id = %request.job_id, "Apply to missing job");
        return Err(ApiError::NotFound(
            "Applying to job failed: Job not found. It may have been removed.".to_string(),
        ));
    }

    let application = store
        .apply(&authed.id, &request.job_id)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(
                "Applying to job failed: You have already applied for this job.".to_string(),
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "application": application })),
    ))
}

/// GET /api/job/applicant/applied?page=1
///
/// # Response
/// ```json
/// {
///   "success": true,
///   "applications": [ { "applicationId": "A_...", "status": "Pending", "applied_at": "...", "job": { ... } } ],
///   "pagination": { ... }
/// }
/// ```
pub async fn applied_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();
    let page = query.page();

    let (rows, total) = JobStore::new(state.db.clone())
        .applied(&authed.id, page)
        .await?;

    let pagination = Pagination::new(total, page, rows.len());
    let applications: Vec<AppliedJob> = rows
        .into_iter()
        .map(|row| AppliedJob {
            application_id: row.application_id,
            status: row.application_status,
            applied_at: row.applied_at,
            job: row.job.into(),
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "applications": applications,
        "pagination": pagination
    })))
}

// ============================================================================
// Saved and viewed jobs
// ============================================================================

/// POST /api/job/applicant/save
/// Toggles the saved state of a post
///
/// # Response
/// ```json
/// { "success": true, "isSaved": true }
/// ```
pub async fn toggle_save_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<JobIdRequest>,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    JobIdValidator.validate(&request).into_api_result()?;

    let state = state_lock.read().await.clone();
    let store = JobStore::new(state.db.clone());

    if store.find_job(&request.job_id).await?.is_none() {
        return Err(ApiError::NotFound(
            "Failed to toggle job save: Job not found".to_string(),
        ));
    }

    let is_saved = store.toggle_save(&authed.id, &request.job_id).await?;
    info!(applicant_id = %authed.id, job_id = %request.job_id, is_saved, "Saved state toggled");

    Ok(Json(json!({ "success": true, "isSaved": is_saved })))
}

/// DELETE /api/job/applicant/save/:id
pub async fn unsave_job(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    Path(job_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();

    let removed = JobStore::new(state.db.clone())
        .unsave(&authed.id, &job_id)
        .await?;

    if !removed {
        return Err(ApiError::NotFound(
            "Removing saved job failed: Job is not in saved jobs".to_string(),
        ));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Job removed from saved jobs"
    })))
}

/// GET /api/job/applicant/saved
///
/// # Response
/// ```json
/// { "success": true, "jobs": [ { "saved_at": "...", "job": { "isSaved": true, ... } } ] }
/// ```
pub async fn saved_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();

    let jobs: Vec<SavedJobEntry> = JobStore::new(state.db.clone())
        .saved(&authed.id)
        .await?
        .into_iter()
        .map(|row| SavedJobEntry {
            saved_at: row.activity_at,
            job: JobListing {
                job: row.job.into(),
                is_saved: true,
            },
        })
        .collect();

    Ok(Json(json!({ "success": true, "jobs": jobs })))
}

/// POST /api/job/applicant/view
///
/// # Request Body
/// ```json
/// { "jobId": "J_..." }
/// ```
pub async fn mark_viewed(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(request): JsonBody<JobIdRequest>,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    JobIdValidator.validate(&request).into_api_result()?;

    let state = state_lock.read().await.clone();
    let store = JobStore::new(state.db.clone());

    if store.find_job(&request.job_id).await?.is_none() {
        return Err(ApiError::NotFound(
            "Failed to mark job as viewed: Job not found".to_string(),
        ));
    }

    let viewed_at = store.mark_viewed(&authed.id, &request.job_id).await?;
    debug!(applicant_id = %authed.id, job_id = %request.job_id, viewed_at = %viewed_at, "Job viewed");

    Ok(Json(json!({ "success": true, "message": "Job marked as viewed" })))
}

/// GET /api/job/applicant/viewed
pub async fn viewed_jobs(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    let state = state_lock.read().await.clone();
    let store = JobStore::new(state.db.clone());

    let saved = store.saved_job_ids(&authed.id).await?;
    let jobs: Vec<ViewedJobEntry> = store
        .viewed(&authed.id)
        .await?
        .into_iter()
        .map(|row| ViewedJobEntry {
            viewed_at: row.activity_at,
            job: JobListing {
                is_saved: saved.contains(&row.job.id),
                job: row.job.into(),
            },
        })
        .collect();

    Ok(Json(json!({ "success": true, "jobs": jobs })))
}
