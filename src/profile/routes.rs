// src/profile/routes.rs

use axum::{
    routing::{get, patch},
    Router,
};

use super::handlers::{employment, profile};

pub fn profile_routes() -> Router {
    Router::new()
        // Account profile routes
        .route(
            "/api/auth/employer/update-profile",
            patch(profile::update_employer_profile),
        )
        .route(
            "/api/auth/applicant/update-profile",
            patch(profile::update_applicant_profile),
        )
        // Employment history routes
        .route(
            "/api/job/applicant/employment-history",
            get(employment::list_employment_history).post(employment::add_employment_history),
        )
        .route(
            "/api/job/applicant/employment-history/:id",
            patch(employment::update_employment_history)
                .delete(employment::delete_employment_history),
        )
}
