// src/decals/validators.rs

use super::models::*;
use crate::common::{ValidationResult, Validator};

const MAX_TAG_LEN: usize = 128;

pub struct CreateDecalValidator;

impl Validator<CreateDecalRequest> for CreateDecalValidator {
    fn validate(&self, data: &CreateDecalRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require("nfcTagId", &data.nfc_tag_id);
        if data.nfc_tag_id.trim().len() > MAX_TAG_LEN {
            result.add_error(
                "nfcTagId",
                &format!("must be less than {} characters", MAX_TAG_LEN),
            );
        }
        result
    }
}

pub struct ScanDecalValidator;

impl Validator<ScanDecalRequest> for ScanDecalValidator {
    fn validate(&self, data: &ScanDecalRequest) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.require("decalId", &data.decal_id);
        result
    }
}
