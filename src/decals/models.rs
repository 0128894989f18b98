// src/decals/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Decal {
    pub id: String,
    pub employer_id: String,
    pub nfc_tag_id: String,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DecalScan {
    pub id: String,
    pub decal_id: String,
    pub applicant_id: String,
    pub scanned_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateDecalRequest {
    #[serde(rename = "nfcTagId", default)]
    pub nfc_tag_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ScanDecalRequest {
    #[serde(rename = "decalId", default)]
    pub decal_id: String,
}
