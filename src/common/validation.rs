// Common validation types and traits

use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::helpers::normalize_phone;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{7,15}$").unwrap());

pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Debug)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, field: &str, message: &str) {
        self.is_valid = false;
        self.errors.push(ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        });
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
            self.errors.extend(other.errors);
        }
    }

    /// Record an error when a required string is missing or blank
    pub fn require(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add_error(field, "is required");
        }
    }

    pub fn check_email(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add_error(field, "is required");
        } else if !is_valid_email(value) {
            self.add_error(field, "must be a valid email address");
        }
    }

    pub fn check_password(&mut self, field: &str, value: &str) {
        if value.len() < MIN_PASSWORD_LEN {
            self.add_error(field, "must be at least 6 characters");
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

pub trait Validator<T> {
    fn validate(&self, data: &T) -> ValidationResult;
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email.trim())
}

/// Accepts digits with an optional leading `+`; spaces and dashes are ignored
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_PATTERN.is_match(&normalize_phone(phone))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("jane@acme.io"));
        assert!(is_valid_email("  jane.doe+jobs@mail.acme.io "));
        assert!(!is_valid_email("jane@acme"));
        assert!(!is_valid_email("jane acme.io"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_phone_pattern() {
        assert!(is_valid_phone("+14155550100"));
        assert!(is_valid_phone("0412 345 678"));
        assert!(is_valid_phone("020-7946-0018"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn test_merge_keeps_all_errors() {
        let mut first = ValidationResult::new();
        first.require("company_name", "");

        let mut second = ValidationResult::new();
        second.check_password("password", "abc");

        first.merge(second);
        assert!(!first.is_valid);
        assert_eq!(first.errors.len(), 2);
        assert_eq!(first.errors[1].field, "password");
    }
}
