// src/jobs/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

const MAX_TITLE_LEN: usize = 200;
const MAX_TEXT_LEN: usize = 5000;
const MAX_LIST_ITEMS: usize = 50;

fn check_choice(result: &mut ValidationResult, field: &str, value: Option<&str>, allowed: &[&str]) {
    if let Some(value) = value {
        if !allowed.contains(&value) {
            result.add_error(field, &format!("must be one of: {}", allowed.join(", ")));
        }
    }
}

fn check_location(result: &mut ValidationResult, location: [f64; 2]) {
    let [lng, lat] = location;
    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        result.add_error("location", "must be [longitude, latitude]");
    }
}

fn check_list(result: &mut ValidationResult, field: &str, items: Option<&Vec<String>>) {
    if let Some(items) = items {
        if items.len() > MAX_LIST_ITEMS {
            result.add_error(field, "has too many entries");
        } else if items.iter().any(|item| item.trim().is_empty()) {
            result.add_error(field, "cannot contain empty entries");
        }
    }
}

fn check_text(result: &mut ValidationResult, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        if value.len() > MAX_TEXT_LEN {
            result.add_error(field, "is too long");
        }
    }
}

fn check_salary(result: &mut ValidationResult, min: Option<f64>, max: Option<f64>) {
    if min.map_or(false, |v| v < 0.0) {
        result.add_error("salary_min", "cannot be negative");
    }
    if max.map_or(false, |v| v < 0.0) {
        result.add_error("salary_max", "cannot be negative");
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            result.add_error("salary_max", "must be greater than or equal to salary_min");
        }
    }
}

fn check_enums(
    result: &mut ValidationResult,
    salary_period: Option<&str>,
    work_type: Option<&str>,
    employment_type: Option<&str>,
    seniority: Option<&str>,
) {
    check_choice(result, "salary_period", salary_period, SALARY_PERIODS);
    check_choice(result, "work_type", work_type, WORK_TYPES);
    check_choice(result, "employment_type", employment_type, EMPLOYMENT_TYPES);
    check_choice(result, "seniority", seniority, SENIORITY_LEVELS);
}

// ============================================================================
// Job Post Validators
// ============================================================================

pub struct JobPostValidator;

impl Validator<CreateJobPost> for JobPostValidator {
    fn validate(&self, data: &CreateJobPost) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.job_title.trim().is_empty() {
            result.add_error("job_title", "is required");
        } else if data.job_title.len() > MAX_TITLE_LEN {
            result.add_error("job_title", "must be less than 200 characters");
        }
        result.require("job_address", &data.job_address);

        match data.location {
            None => result.add_error("location", "is required"),
            Some(location) => check_location(&mut result, location),
        }

        check_text(&mut result, "summary", data.summary.as_deref());
        check_text(&mut result, "closing_statement", data.closing_statement.as_deref());
        check_list(&mut result, "key_responsibilities", data.key_responsibilities.as_ref());
        check_list(&mut result, "qualifications", data.qualifications.as_ref());
        check_salary(&mut result, data.salary_min, data.salary_max);
        check_enums(
            &mut result,
            data.salary_period.as_deref(),
            data.work_type.as_deref(),
            data.employment_type.as_deref(),
            data.seniority.as_deref(),
        );

        result
    }
}

impl Validator<UpdateJobPost> for JobPostValidator {
    fn validate(&self, data: &UpdateJobPost) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(title) = &data.job_title {
            if title.trim().is_empty() {
                result.add_error("job_title", "cannot be empty");
            } else if title.len() > MAX_TITLE_LEN {
                result.add_error("job_title", "must be less than 200 characters");
            }
        }
        if let Some(address) = &data.job_address {
            if address.trim().is_empty() {
                result.add_error("job_address", "cannot be empty");
            }
        }
        if let Some(location) = data.location {
            check_location(&mut result, location);
        }

        check_text(&mut result, "summary", data.summary.as_deref());
        check_text(&mut result, "closing_statement", data.closing_statement.as_deref());
        check_list(&mut result, "key_responsibilities", data.key_responsibilities.as_ref());
        check_list(&mut result, "qualifications", data.qualifications.as_ref());
        check_salary(&mut result, data.salary_min, data.salary_max);
        check_enums(
            &mut result,
            data.salary_period.as_deref(),
            data.work_type.as_deref(),
            data.employment_type.as_deref(),
            data.seniority.as_deref(),
        );

        result
    }
}

// ============================================================================
// Applicant Request Validators
// ============================================================================

pub struct DistanceValidator;

impl Validator<DistanceRequest> for DistanceValidator {
    fn validate(&self, data: &DistanceRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        match data.latitude {
            None => result.add_error("latitude", "is required"),
            Some(lat) if !(-90.0..=90.0).contains(&lat) => {
                result.add_error("latitude", "must be between -90 and 90")
            }
            _ => {}
        }
        match data.longitude {
            None => result.add_error("longitude", "is required"),
            Some(lng) if !(-180.0..=180.0).contains(&lng) => {
                result.add_error("longitude", "must be between -180 and 180")
            }
            _ => {}
        }
        match data.max_distance {
            None => result.add_error("maxDistance", "is required"),
            Some(d) if !d.is_finite() || d <= 0.0 => {
                result.add_error("maxDistance", "must be a positive number of metres")
            }
            _ => {}
        }

        result
    }
}

pub struct SearchValidator;

impl Validator<SearchQuery> for SearchValidator {
    fn validate(&self, data: &SearchQuery) -> ValidationResult {
        let mut result = ValidationResult::new();
        if data.title.trim().is_empty() {
            result.add_error("title", "is required");
        } else if data.title.len() > MAX_TITLE_LEN {
            result.add_error("title", "is too long");
        }
        result
    }
}

pub struct JobIdValidator;

impl Validator<JobIdRequest> for JobIdValidator {
    fn validate(&self, data: &JobIdRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require("jobId", &data.job_id);
        result
    }
}
