// src/jobs/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::common::helpers::parse_string_list;
use crate::services::credentials::{Applicant, Employer};

/// Page size for every paginated job listing
pub const PAGE_SIZE: i64 = 10;

pub const SALARY_PERIODS: &[&str] = &["Hourly", "Weekly", "Monthly", "Annually"];
pub const WORK_TYPES: &[&str] = &["Remote", "Hybrid", "Onsite"];
pub const EMPLOYMENT_TYPES: &[&str] = &["Full Time", "Part Time", "Contract"];
pub const SENIORITY_LEVELS: &[&str] = &["Junior", "Mid", "Senior"];

// ============================================================================
// Job Post Models
// ============================================================================

/// `job_posts` row; list columns hold JSON arrays
#[derive(FromRow, Debug, Clone)]
pub struct JobPostRow {
    pub id: String,
    pub employer_id: String,
    pub company_name: String,
    pub job_title: String,
    pub job_address: String,
    pub location_lng: f64,
    pub location_lat: f64,
    pub summary: String,
    pub key_responsibilities: String,
    pub qualifications: String,
    pub closing_statement: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<String>,
    pub work_type: Option<String>,
    pub employment_type: Option<String>,
    pub seniority: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Serialize, Debug, Clone)]
pub struct JobPost {
    pub id: String,
    pub employer_id: String,
    pub company_name: String,
    pub job_title: String,
    pub job_address: String,
    /// `[longitude, latitude]`
    pub location: [f64; 2],
    pub summary: String,
    pub key_responsibilities: Vec<String>,
    pub qualifications: Vec<String>,
    pub closing_statement: String,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<String>,
    pub work_type: Option<String>,
    pub employment_type: Option<String>,
    pub seniority: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<JobPostRow> for JobPost {
    fn from(row: JobPostRow) -> Self {
        JobPost {
            id: row.id,
            employer_id: row.employer_id,
            company_name: row.company_name,
            job_title: row.job_title,
            job_address: row.job_address,
            location: [row.location_lng, row.location_lat],
            summary: row.summary,
            key_responsibilities: parse_string_list(&row.key_responsibilities),
            qualifications: parse_string_list(&row.qualifications),
            closing_statement: row.closing_statement,
            salary_min: row.salary_min,
            salary_max: row.salary_max,
            salary_currency: row.salary_currency,
            salary_period: row.salary_period,
            work_type: row.work_type,
            employment_type: row.employment_type,
            seniority: row.seniority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A job post as listed to an applicant
#[derive(Serialize, Debug)]
pub struct JobListing {
    #[serde(flatten)]
    pub job: JobPost,
    #[serde(rename = "isSaved")]
    pub is_saved: bool,
}

/// A job post opened by an applicant
#[derive(Serialize, Debug)]
pub struct ApplicantJobView {
    #[serde(flatten)]
    pub job: JobPost,
    pub employer: Option<Employer>,
    #[serde(rename = "isSaved")]
    pub is_saved: bool,
    #[serde(rename = "isApplied")]
    pub is_applied: bool,
}

#[derive(Serialize, Debug, Default, PartialEq)]
pub struct ApplicationStats {
    pub total: i64,
    pub rejected: i64,
    pub hired: i64,
}

/// A job post opened by the employer who owns it
#[derive(Serialize, Debug)]
pub struct EmployerJobView {
    #[serde(flatten)]
    pub job: JobPost,
    pub employer: Option<Employer>,
    #[serde(rename = "applicationStats")]
    pub application_stats: ApplicationStats,
    pub applications: Vec<ApplicationWithApplicant>,
}

#[derive(Deserialize, Debug)]
pub struct CreateJobPost {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub job_address: String,
    pub location: Option<[f64; 2]>,
    pub summary: Option<String>,
    pub key_responsibilities: Option<Vec<String>>,
    pub qualifications: Option<Vec<String>>,
    pub closing_statement: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<String>,
    pub work_type: Option<String>,
    pub employment_type: Option<String>,
    pub seniority: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateJobPost {
    pub job_title: Option<String>,
    pub job_address: Option<String>,
    pub location: Option<[f64; 2]>,
    pub summary: Option<String>,
    pub key_responsibilities: Option<Vec<String>>,
    pub qualifications: Option<Vec<String>>,
    pub closing_statement: Option<String>,
    pub salary_min: Option<f64>,
    pub salary_max: Option<f64>,
    pub salary_currency: Option<String>,
    pub salary_period: Option<String>,
    pub work_type: Option<String>,
    pub employment_type: Option<String>,
    pub seniority: Option<String>,
}

// ============================================================================
// Applications
// ============================================================================

#[derive(FromRow, Serialize, Debug, Clone)]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub applicant_id: String,
    pub status: String,
    pub applied_at: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct ApplicationWithApplicant {
    #[serde(flatten)]
    pub application: Application,
    pub applicant: Option<Applicant>,
}

/// One of the caller's applications with the job it targets
#[derive(Serialize, Debug)]
pub struct AppliedJob {
    #[serde(rename = "applicationId")]
    pub application_id: String,
    pub status: String,
    pub applied_at: Option<String>,
    pub job: JobPost,
}

// ============================================================================
// Activity
// ============================================================================

#[derive(FromRow, Serialize, Debug, Clone)]
pub struct SearchHistoryEntry {
    pub id: String,
    pub query: String,
    pub created_at: Option<String>,
}

#[derive(Serialize, Debug, PartialEq)]
pub struct PopularityStats {
    #[serde(rename = "applicationCount")]
    pub application_count: i64,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct PopularJob {
    #[serde(rename = "popularityStats")]
    pub popularity_stats: PopularityStats,
    #[serde(rename = "jobDetails")]
    pub job_details: JobListing,
}

#[derive(Serialize, Debug)]
pub struct SavedJobEntry {
    pub saved_at: Option<String>,
    pub job: JobListing,
}

#[derive(Serialize, Debug)]
pub struct ViewedJobEntry {
    pub viewed_at: Option<String>,
    pub job: JobListing,
}

// ============================================================================
// Request Models
// ============================================================================

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    pub page: Option<i64>,
}

impl PageQuery {
    /// 1-based page number; anything below 1 reads as the first page
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }
}

#[derive(Serialize, Debug, PartialEq)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
    #[serde(rename = "hasNextPage")]
    pub has_next_page: bool,
    #[serde(rename = "hasPrevPage")]
    pub has_prev_page: bool,
}

/// Rows before `page`, saturating for absurd page numbers
pub fn page_offset(page: i64) -> i64 {
    page.saturating_sub(1).max(0).saturating_mul(PAGE_SIZE)
}

impl Pagination {
    pub fn new(total: i64, page: i64, returned: usize) -> Self {
        let skipped = page_offset(page);
        Self {
            total,
            page,
            total_pages: (total + PAGE_SIZE - 1) / PAGE_SIZE,
            has_next_page: skipped.saturating_add(returned as i64) < total,
            has_prev_page: page > 1,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct DistanceRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Metres
    #[serde(rename = "maxDistance")]
    pub max_distance: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "isFinalSearch", default)]
    pub is_final_search: bool,
}

#[derive(Deserialize, Debug)]
pub struct JobIdRequest {
    #[serde(rename = "jobId", default)]
    pub job_id: String,
}
