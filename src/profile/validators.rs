// src/profile/validators.rs

use super::models::*;
use crate::common::validation::is_valid_phone;
use crate::common::{ValidationResult, Validator};
use chrono::NaiveDate;

const MAX_TEXT_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 2000;

fn check_date(result: &mut ValidationResult, field: &str, value: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            result.add_error(field, "must be in YYYY-MM-DD format");
            None
        }
    }
}

fn check_length(result: &mut ValidationResult, field: &str, value: &str, max: usize) {
    if value.len() > max {
        result.add_error(field, &format!("must be less than {} characters", max));
    }
}

/// A field that is present in a partial update must not be blank
fn check_present(result: &mut ValidationResult, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        if value.trim().is_empty() {
            result.add_error(field, "cannot be empty");
        } else {
            check_length(result, field, value, MAX_TEXT_LEN);
        }
    }
}

// ============================================================================
// Account Profile Validators
// ============================================================================

pub struct EmployerProfileValidator;

impl Validator<EmployerProfileUpdate> for EmployerProfileValidator {
    fn validate(&self, data: &EmployerProfileUpdate) -> ValidationResult {
        let mut result = ValidationResult::new();

        check_present(&mut result, "company_name", data.company_name.as_deref());
        check_present(&mut result, "full_name", data.full_name.as_deref());
        check_present(&mut result, "address", data.address.as_deref());

        if let Some(phone) = &data.phone {
            if !is_valid_phone(phone) {
                result.add_error("phone", "must be a valid phone number");
            }
        }

        if let Some([lng, lat]) = data.location {
            if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
                result.add_error("location", "must be [longitude, latitude]");
            }
        }

        if let Some(body) = &data.body {
            check_length(&mut result, "body", body, MAX_DESCRIPTION_LEN);
        }

        result
    }
}

pub struct ApplicantProfileValidator;

impl Validator<ApplicantProfileUpdate> for ApplicantProfileValidator {
    fn validate(&self, data: &ApplicantProfileUpdate) -> ValidationResult {
        let mut result = ValidationResult::new();

        check_present(&mut result, "name", data.name.as_deref());
        if let Some(heading) = &data.heading {
            check_length(&mut result, "heading", heading, MAX_TEXT_LEN);
        }
        if let Some(description) = &data.description {
            check_length(&mut result, "description", description, MAX_DESCRIPTION_LEN);
        }

        result
    }
}

// ============================================================================
// Employment History Validators
// ============================================================================

pub struct EmploymentValidator;

impl Validator<CreateEmploymentRequest> for EmploymentValidator {
    fn validate(&self, data: &CreateEmploymentRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.require("job_title", &data.job_title);
        check_length(&mut result, "job_title", &data.job_title, MAX_TEXT_LEN);
        result.require("company_name", &data.company_name);
        check_length(&mut result, "company_name", &data.company_name, MAX_TEXT_LEN);
        result.require("employment_type", &data.employment_type);

        let start = check_date(&mut result, "start_date", &data.start_date);
        if let Some(end_date) = &data.end_date {
            let end = check_date(&mut result, "end_date", end_date);
            if let (Some(start), Some(end)) = (start, end) {
                if end < start {
                    result.add_error("end_date", "must be after start_date");
                }
            }
        }

        if let Some(description) = &data.description {
            check_length(&mut result, "description", description, MAX_DESCRIPTION_LEN);
        }

        result
    }
}

impl Validator<UpdateEmploymentRequest> for EmploymentValidator {
    fn validate(&self, data: &UpdateEmploymentRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if data.job_title.is_none()
            && data.company_logo.is_none()
            && data.company_name.is_none()
            && data.employment_type.is_none()
            && data.start_date.is_none()
            && data.end_date.is_none()
            && data.description.is_none()
        {
            result.add_error("general", "At least one field must be provided for update");
            return result;
        }

        check_present(&mut result, "job_title", data.job_title.as_deref());
        check_present(&mut result, "company_name", data.company_name.as_deref());
        check_present(&mut result, "employment_type", data.employment_type.as_deref());

        let start = data
            .start_date
            .as_deref()
            .and_then(|d| check_date(&mut result, "start_date", d));
        let end = data
            .end_date
            .as_deref()
            .and_then(|d| check_date(&mut result, "end_date", d));
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                result.add_error("end_date", "must be after start_date");
            }
        }

        if let Some(description) = &data.description {
            check_length(&mut result, "description", description, MAX_DESCRIPTION_LEN);
        }

        result
    }
}
