// src/jobs/routes.rs

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use super::handlers::{applicant, employer};

/// Create the jobs router with all job-related routes
pub fn jobs_routes() -> Router {
    Router::new()
        // Employer job post routes
        .route("/api/job/employer/create", post(employer::create_job))
        .route("/api/job/employer/get/all", get(employer::list_jobs))
        .route("/api/job/employer/get/:id", get(employer::get_job))
        .route("/api/job/employer/update/:id", patch(employer::update_job))
        .route("/api/job/employer/delete/:id", delete(employer::delete_job))
        // Applicant discovery routes
        .route("/api/job/applicant/map/distance", post(applicant::jobs_by_distance))
        .route("/api/job/applicant/search", get(applicant::search_jobs))
        .route("/api/job/applicant/search/history", get(applicant::search_history))
        .route("/api/job/applicant/popular", get(applicant::popular_jobs))
        .route("/api/job/applicant/recent", get(applicant::recent_jobs))
        .route("/api/job/applicant/recommended", get(applicant::recommended_jobs))
        .route("/api/job/applicant/job/:id", get(applicant::get_job_for_applicant))
        // Applicant activity routes
        .route("/api/job/applicant/apply", post(applicant::apply_to_job))
        .route("/api/job/applicant/applied", get(applicant::applied_jobs))
        .route("/api/job/applicant/save", post(applicant::toggle_save_job))
        .route("/api/job/applicant/save/:id", delete(applicant::unsave_job))
        .route("/api/job/applicant/saved", get(applicant::saved_jobs))
        .route("/api/job/applicant/view", post(applicant::mark_viewed))
        .route("/api/job/applicant/viewed", get(applicant::viewed_jobs))
}
