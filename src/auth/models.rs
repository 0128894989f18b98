//! Authentication request and response models

use serde::Deserialize;

pub use crate::services::auth::{Account, OtpContext};
use crate::services::credentials::Role;

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct EmployerSignupRequest {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub address: String,
    /// `[longitude, latitude]`
    pub location: Option<[f64; 2]>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
}

/// Also the body of `POST /api/auth/applicant/link-password`
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicantSignupRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployerSigninRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicantSigninRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: String,
    pub context: OtpContext,
    #[serde(rename = "userType")]
    pub user_type: Role,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(rename = "otpCode", default)]
    pub otp_code: String,
    pub context: OtpContext,
    #[serde(rename = "userType")]
    pub user_type: Role,
    /// Required when `context` is `forgot-password`
    #[serde(rename = "newPassword")]
    pub new_password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CodeRequest {
    #[serde(default)]
    pub code: String,
}

/// Query string a provider appends to its redirect back to us
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}
