// src/auth/validators.rs

use super::models::*;
use crate::common::validation::is_valid_phone;
use crate::common::{ValidationResult, Validator};

// ============================================================================
// Signup / Signin Validators
// ============================================================================

pub struct EmployerSignupValidator;

impl Validator<EmployerSignupRequest> for EmployerSignupValidator {
    fn validate(&self, data: &EmployerSignupRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        result.require("company_name", &data.company_name);
        result.require("full_name", &data.full_name);
        result.require("address", &data.address);
        result.check_email("email", &data.email);

        if data.phone.trim().is_empty() {
            result.add_error("phone", "is required");
        } else if !is_valid_phone(&data.phone) {
            result.add_error("phone", "must be a valid phone number");
        }

        result.check_password("password", &data.password);

        match data.location {
            None => result.add_error("location", "is required"),
            Some([lng, lat]) => {
                if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location", "must be [longitude, latitude]");
                }
            }
        }

        result
    }
}

pub struct ApplicantSignupValidator;

impl Validator<ApplicantSignupRequest> for ApplicantSignupValidator {
    fn validate(&self, data: &ApplicantSignupRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.check_email("email", &data.email);
        result.check_password("password", &data.password);
        result
    }
}

pub struct SigninValidator;

impl Validator<EmployerSigninRequest> for SigninValidator {
    fn validate(&self, data: &EmployerSigninRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        let email = data.email.as_deref().unwrap_or("").trim();
        let phone = data.phone.as_deref().unwrap_or("").trim();
        if email.is_empty() && phone.is_empty() {
            result.add_error("email", "email or phone is required");
        } else if !email.is_empty() {
            result.check_email("email", email);
        }

        result.require("password", &data.password);
        result
    }
}

impl Validator<ApplicantSigninRequest> for SigninValidator {
    fn validate(&self, data: &ApplicantSigninRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.check_email("email", &data.email);
        result.require("password", &data.password);
        result
    }
}

// ============================================================================
// OTP Validators
// ============================================================================

pub struct OtpValidator;

impl Validator<SendOtpRequest> for OtpValidator {
    fn validate(&self, data: &SendOtpRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.check_email("email", &data.email);
        result
    }
}

impl Validator<VerifyOtpRequest> for OtpValidator {
    fn validate(&self, data: &VerifyOtpRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.check_email("email", &data.email);

        let code = data.otp_code.trim();
        if code.is_empty() {
            result.add_error("otpCode", "is required");
        } else if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
            result.add_error("otpCode", "must be a 6-digit code");
        }

        if data.context == OtpContext::ForgotPassword {
            match data.new_password.as_deref() {
                None => result.add_error("newPassword", "is required"),
                Some(pw) => result.check_password("newPassword", pw),
            }
        }

        result
    }
}

pub struct CodeValidator;

impl Validator<CodeRequest> for CodeValidator {
    fn validate(&self, data: &CodeRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        if data.code.trim().is_empty() {
            result.add_error("code", "Auth code required");
        }
        result
    }
}
