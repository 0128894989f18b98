// src/profile/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub use crate::services::credentials::{ApplicantProfileUpdate, EmployerProfileUpdate};

// ============================================================================
// Employment History
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EmploymentHistory {
    pub id: String,
    pub applicant_id: String,
    pub job_title: String,
    pub company_logo: Option<String>,
    pub company_name: String,
    pub employment_type: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateEmploymentRequest {
    #[serde(default)]
    pub job_title: String,
    pub company_logo: Option<String>,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub employment_type: String,
    #[serde(default)]
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateEmploymentRequest {
    pub job_title: Option<String>,
    pub company_logo: Option<String>,
    pub company_name: Option<String>,
    pub employment_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}
