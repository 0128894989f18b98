// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., J_K7NP3X for job posts)

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// Employer account (EM_)
    Employer,
    /// Applicant account (AP_)
    Applicant,
    /// Job post (J_)
    Job,
    /// Job application (A_)
    Application,
    /// Employment history entry (EH_)
    Employment,
    /// Saved job (S_)
    SavedJob,
    /// Viewed job (W_) - W for Watch/View
    View,
    /// Search history entry (Q_) - Q for Query
    Search,
    /// NFC decal (D_)
    Decal,
    /// Decal scan (DS_)
    DecalScan,
}

impl EntityPrefix {
    /// Get the string prefix for this entity type
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Employer => "EM",
            EntityPrefix::Applicant => "AP",
            EntityPrefix::Job => "J",
            EntityPrefix::Application => "A",
            EntityPrefix::Employment => "EH",
            EntityPrefix::SavedJob => "S",
            EntityPrefix::View => "W",
            EntityPrefix::Search => "Q",
            EntityPrefix::Decal => "D",
            EntityPrefix::DecalScan => "DS",
        }
    }
}

/// Generate a random Crockford Base32 string of specified length
fn generate_crockford_string(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..32);
            CROCKFORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Generate a prefixed ID using Crockford Base32 encoding
///
/// # Returns
/// A string in format "PREFIX_XXXXXX" (e.g., "J_K7NP3X")
pub fn generate_id(prefix: EntityPrefix) -> String {
    format!("{}_{}", prefix.as_str(), generate_crockford_string(6))
}

// ============================================================================
// Convenience functions for each entity type
// ============================================================================

pub fn generate_employer_id() -> String {
    generate_id(EntityPrefix::Employer)
}

pub fn generate_applicant_id() -> String {
    generate_id(EntityPrefix::Applicant)
}

pub fn generate_job_id() -> String {
    generate_id(EntityPrefix::Job)
}

pub fn generate_application_id() -> String {
    generate_id(EntityPrefix::Application)
}

pub fn generate_employment_id() -> String {
    generate_id(EntityPrefix::Employment)
}

pub fn generate_saved_job_id() -> String {
    generate_id(EntityPrefix::SavedJob)
}

pub fn generate_view_id() -> String {
    generate_id(EntityPrefix::View)
}

pub fn generate_search_id() -> String {
    generate_id(EntityPrefix::Search)
}

pub fn generate_decal_id() -> String {
    generate_id(EntityPrefix::Decal)
}

pub fn generate_decal_scan_id() -> String {
    generate_id(EntityPrefix::DecalScan)
}
