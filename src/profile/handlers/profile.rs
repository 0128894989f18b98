// src/profile/handlers/profile.rs

use axum::extract::{Extension, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::super::models::{ApplicantProfileUpdate, EmployerProfileUpdate};
use super::super::validators::{ApplicantProfileValidator, EmployerProfileValidator};
use crate::auth::{auth_failure, AuthedUser};
use crate::common::{ApiError, AppState, JsonBody, Validator};

/// PATCH /api/auth/employer/update-profile
/// Partial update; absent fields keep their current value
///
/// # Request Body
/// ```json
/// {
///   "company_name": "Acme Pty Ltd",
///   "phone": "+61400000001",
///   "company_logo": "https://cdn.example.com/logo.png",
///   "location": [151.2093, -33.8688],
///   "heading": "We build things",
///   "body": "About us..."
/// }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "employer": { ... } }
/// ```
pub async fn update_employer_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(update): JsonBody<EmployerProfileUpdate>,
) -> Result<Json<Value>, ApiError> {
    authed.require_employer()?;

    let validation = EmployerProfileValidator.validate(&update);
    if !validation.is_valid {
        warn!(
            employer_id = %authed.id,
            errors = ?validation.errors,
            "Employer profile validation failed"
        );
        return Err(ApiError::from(validation));
    }

    let state = state_lock.read().await.clone();
    info!(employer_id = %authed.id, "Updating employer profile");

    let employer = state
        .auth
        .update_employer_profile(&authed.id, &update)
        .await
        .map_err(|e| auth_failure("Profile update failed", e))?;

    Ok(Json(json!({ "success": true, "employer": employer })))
}

/// PATCH /api/auth/applicant/update-profile
///
/// # Request Body
/// ```json
/// { "name": "Sam", "profile_pic": "https://...", "heading": "Rust developer", "description": "..." }
/// ```
///
/// # Response
/// ```json
/// { "success": true, "applicant": { ... } }
/// ```
pub async fn update_applicant_profile(
    Extension(state_lock): Extension<Arc<RwLock<AppState>>>,
    authed: AuthedUser,
    JsonBody(update): JsonBody<ApplicantProfileUpdate>,
) -> Result<Json<Value>, ApiError> {
    authed.require_applicant()?;
    ApplicantProfileValidator.validate(&update).into_api_result()?;

    let state = state_lock.read().await.clone();
    info!(applicant_id = %authed.id, "Updating applicant profile");

    let applicant = state
        .auth
        .update_applicant_profile(&authed.id, &update)
        .await
        .map_err(|e| auth_failure("Profile update failed", e))?;

    Ok(Json(json!({ "success": true, "applicant": applicant })))
}
