// src/services/credentials.rs
//! Employer and applicant account storage.
//!
//! Passwords are hashed with Argon2 in every write path before they reach the
//! database, and the serializable account views never carry the hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

use crate::common::{
    generate_applicant_id, generate_employer_id, normalize_email, normalize_phone, safe_email_log,
};
use crate::services::oauth::OAuthProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employer,
    Applicant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employer => "employer",
            Role::Applicant => "applicant",
        }
    }

    fn table(&self) -> &'static str {
        match self {
            Role::Employer => "employers",
            Role::Applicant => "applicants",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} is already registered")]
    Duplicate(&'static str),

    #[error("This email is already registered under another account type")]
    RoleConflict,

    #[error("Account not found")]
    NotFound,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                // SQLite reports "UNIQUE constraint failed: <table>.<column>"
                let message = db_err.message();
                let field = if message.ends_with(".email") {
                    "email"
                } else if message.ends_with(".phone") {
                    "phone"
                } else if message.ends_with(".google_id") {
                    "google account"
                } else if message.ends_with(".linkedin_id") {
                    "linkedin account"
                } else {
                    "account"
                };
                return StoreError::Duplicate(field);
            }
            // Raised by the cross-role triggers in the schema
            if db_err.message().contains("registered under another role") {
                return StoreError::RoleConflict;
            }
        }
        StoreError::Database(e)
    }
}

// ============================================================================
// Records
// ============================================================================

/// Employer row, including the password hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct EmployerRecord {
    pub id: String,
    pub company_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: Option<String>,
    pub company_logo: Option<String>,
    pub address: String,
    pub location_lng: Option<f64>,
    pub location_lat: Option<f64>,
    pub heading: Option<String>,
    pub body: Option<String>,
    pub is_verified: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Applicant row, including the password hash. Never serialized.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicantRecord {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub pending_password_hash: Option<String>,
    pub google_id: Option<String>,
    pub linkedin_id: Option<String>,
    pub profile_pic: Option<String>,
    pub heading: Option<String>,
    pub description: Option<String>,
    pub is_verified: bool,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl ApplicantRecord {
    pub fn is_oauth_linked(&self) -> bool {
        self.google_id.is_some() || self.linkedin_id.is_some()
    }

    pub fn provider_id(&self, provider: OAuthProvider) -> Option<&str> {
        match provider {
            OAuthProvider::Google => self.google_id.as_deref(),
            OAuthProvider::LinkedIn => self.linkedin_id.as_deref(),
        }
    }
}

/// Public employer view
#[derive(Debug, Clone, Serialize)]
pub struct Employer {
    pub id: String,
    pub company_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub company_logo: Option<String>,
    pub address: String,
    /// `[longitude, latitude]`
    pub location: Option<[f64; 2]>,
    pub heading: Option<String>,
    pub body: Option<String>,
    pub is_verified: bool,
    pub created_at: Option<String>,
}

impl From<EmployerRecord> for Employer {
    fn from(r: EmployerRecord) -> Self {
        let location = match (r.location_lng, r.location_lat) {
            (Some(lng), Some(lat)) => Some([lng, lat]),
            _ => None,
        };
        Self {
            id: r.id,
            company_name: r.company_name,
            full_name: r.full_name,
            email: r.email,
            phone: r.phone,
            company_logo: r.company_logo,
            address: r.address,
            location,
            heading: r.heading,
            body: r.body,
            is_verified: r.is_verified,
            created_at: r.created_at,
        }
    }
}

/// Public applicant view
#[derive(Debug, Clone, Serialize)]
pub struct Applicant {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub profile_pic: Option<String>,
    pub heading: Option<String>,
    pub description: Option<String>,
    pub is_verified: bool,
    pub has_password: bool,
    pub google_linked: bool,
    pub linkedin_linked: bool,
    pub created_at: Option<String>,
}

impl From<ApplicantRecord> for Applicant {
    fn from(r: ApplicantRecord) -> Self {
        Self {
            has_password: r.password_hash.is_some(),
            google_linked: r.google_id.is_some(),
            linkedin_linked: r.linkedin_id.is_some(),
            id: r.id,
            email: r.email,
            name: r.name,
            profile_pic: r.profile_pic,
            heading: r.heading,
            description: r.description,
            is_verified: r.is_verified,
            created_at: r.created_at,
        }
    }
}

// ============================================================================
// Write payloads
// ============================================================================

#[derive(Debug, Clone)]
pub struct NewEmployer {
    pub company_name: String,
    pub full_name: String,
    pub address: String,
    pub location: Option<[f64; 2]>,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewApplicant {
    pub email: String,
    pub name: Option<String>,
    pub password: Option<String>,
    pub provider: Option<(OAuthProvider, String)>,
    pub profile_pic: Option<String>,
    pub is_verified: bool,
}

/// Partial employer profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployerProfileUpdate {
    pub company_name: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub company_logo: Option<String>,
    pub address: Option<String>,
    pub location: Option<[f64; 2]>,
    pub heading: Option<String>,
    pub body: Option<String>,
}

/// Partial applicant profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicantProfileUpdate {
    pub name: Option<String>,
    pub profile_pic: Option<String>,
    pub heading: Option<String>,
    pub description: Option<String>,
}

// ============================================================================
// Password hashing
// ============================================================================

pub fn hash_password(plaintext: &str) -> Result<String, StoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::Hashing(e.to_string()))
}

/// A missing or unparsable hash never matches.
pub fn verify_password(candidate: &str, password_hash: Option<&str>) -> bool {
    let Some(stored) = password_hash else {
        return false;
    };
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

fn provider_column(provider: OAuthProvider) -> &'static str {
    match provider {
        OAuthProvider::Google => "google_id",
        OAuthProvider::LinkedIn => "linkedin_id",
    }
}

// ============================================================================
// Store
// ============================================================================

#[derive(Debug, Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ---- Employers ----

    pub async fn find_employer_by_id(&self, id: &str) -> Result<Option<EmployerRecord>, StoreError> {
        let employer = sqlx::query_as::<_, EmployerRecord>("SELECT * FROM employers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employer)
    }

    /// Every employer, newest first
    pub async fn all_employers(&self) -> Result<Vec<EmployerRecord>, StoreError> {
        let employers = sqlx::query_as::<_, EmployerRecord>(
            "SELECT * FROM employers ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(employers)
    }

    pub async fn find_employer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<EmployerRecord>, StoreError> {
        let employer =
            sqlx::query_as::<_, EmployerRecord>("SELECT * FROM employers WHERE email = ?")
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;
        Ok(employer)
    }

    /// Matches on either identifier; a `None` identifier never matches.
    pub async fn find_employer_by_email_or_phone(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Result<Option<EmployerRecord>, StoreError> {
        if email.is_none() && phone.is_none() {
            return Ok(None);
        }

        let employer = sqlx::query_as::<_, EmployerRecord>(
            "SELECT * FROM employers WHERE email = ? OR phone = ? LIMIT 1",
        )
        .bind(email.map(normalize_email))
        .bind(phone.map(normalize_phone))
        .fetch_optional(&self.pool)
        .await?;
        Ok(employer)
    }

    pub async fn create_employer(&self, new: &NewEmployer) -> Result<EmployerRecord, StoreError> {
        let id = generate_employer_id();
        let password_hash = hash_password(&new.password)?;
        let email = normalize_email(&new.email);

        sqlx::query(
            r#"
            INSERT INTO employers (id, company_name, full_name, email, phone, password_hash, address,
                                   location_lng, location_lat, is_verified)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&id)
        .bind(new.company_name.trim())
        .bind(new.full_name.trim())
        .bind(&email)
        .bind(normalize_phone(&new.phone))
        .bind(&password_hash)
        .bind(new.address.trim())
        .bind(new.location.map(|l| l[0]))
        .bind(new.location.map(|l| l[1]))
        .execute(&self.pool)
        .await?;

        info!(employer_id = %id, email = %safe_email_log(&email), "Employer account created");

        self.find_employer_by_id(&id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    pub async fn update_employer_profile(
        &self,
        id: &str,
        update: &EmployerProfileUpdate,
    ) -> Result<EmployerRecord, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE employers
            SET company_name = COALESCE(?, company_name),
                full_name = COALESCE(?, full_name),
                phone = COALESCE(?, phone),
                company_logo = COALESCE(?, company_logo),
                address = COALESCE(?, address),
                location_lng = COALESCE(?, location_lng),
                location_lat = COALESCE(?, location_lat),
                heading = COALESCE(?, heading),
                body = COALESCE(?, body),
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(update.company_name.as_deref().map(str::trim))
        .bind(update.full_name.as_deref().map(str::trim))
        .bind(update.phone.as_deref().map(normalize_phone))
        .bind(update.company_logo.as_deref())
        .bind(update.address.as_deref().map(str::trim))
        .bind(update.location.map(|l| l[0]))
        .bind(update.location.map(|l| l[1]))
        .bind(update.heading.as_deref())
        .bind(update.body.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.find_employer_by_id(id).await?.ok_or(StoreError::NotFound)
    }

    // ---- Applicants ----

    pub async fn find_applicant_by_id(
        &self,
        id: &str,
    ) -> Result<Option<ApplicantRecord>, StoreError> {
        let applicant =
            sqlx::query_as::<_, ApplicantRecord>("SELECT * FROM applicants WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(applicant)
    }

    /// Every applicant, newest first
    pub async fn all_applicants(&self) -> Result<Vec<ApplicantRecord>, StoreError> {
        let applicants = sqlx::query_as::<_, ApplicantRecord>(
            "SELECT * FROM applicants ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(applicants)
    }

    pub async fn find_applicant_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ApplicantRecord>, StoreError> {
        let applicant =
            sqlx::query_as::<_, ApplicantRecord>("SELECT * FROM applicants WHERE email = ?")
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?;
        Ok(applicant)
    }

    pub async fn create_applicant(&self, new: &NewApplicant) -> Result<ApplicantRecord, StoreError> {
        let id = generate_applicant_id();
        let email = normalize_email(&new.email);
        let password_hash = match &new.password {
            Some(plaintext) => Some(hash_password(plaintext)?),
            None => None,
        };
        let (google_id, linkedin_id) = match &new.provider {
            Some((OAuthProvider::Google, pid)) => (Some(pid.as_str()), None),
            Some((OAuthProvider::LinkedIn, pid)) => (None, Some(pid.as_str())),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO applicants (id, email, name, password_hash, google_id, linkedin_id,
                                    profile_pic, is_verified)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&email)
        .bind(new.name.as_deref())
        .bind(password_hash.as_deref())
        .bind(google_id)
        .bind(linkedin_id)
        .bind(new.profile_pic.as_deref())
        .bind(new.is_verified)
        .execute(&self.pool)
        .await?;

        info!(
            applicant_id = %id,
            email = %safe_email_log(&email),
            provider = ?new.provider.as_ref().map(|(p, _)| p.as_str()),
            "Applicant account created"
        );

        self.find_applicant_by_id(&id)
            .await?
            .ok_or(StoreError::NotFound)
    }

    /// Stores a password for an OAuth-created applicant. It only becomes the
    /// sign-in password once the follow-up OTP is verified.
    /// Returns false when the applicant already has a password.
    pub async fn set_pending_password(&self, id: &str, password: &str) -> Result<bool, StoreError> {
        let password_hash = hash_password(password)?;

        let result = sqlx::query(
            "UPDATE applicants SET pending_password_hash = ?, updated_at = datetime('now') WHERE id = ? AND password_hash IS NULL",
        )
        .bind(&password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Marks an unverified applicant verified through a provider login.
    /// Any password set before verification is discarded since nobody proved
    /// ownership of the email when it was chosen.
    pub async fn verify_through_provider(&self, id: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE applicants
            SET is_verified = 1, password_hash = NULL, pending_password_hash = NULL,
                updated_at = datetime('now')
            WHERE id = ? AND is_verified = 0
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Attaches a provider identity to an applicant that has none for that provider yet.
    pub async fn link_provider(
        &self,
        applicant_id: &str,
        provider: OAuthProvider,
        provider_id: &str,
    ) -> Result<(), StoreError> {
        let column = provider_column(provider);
        let sql = format!(
            "UPDATE applicants SET {col} = ?, updated_at = datetime('now') WHERE id = ? AND {col} IS NULL",
            col = column
        );

        sqlx::query(&sql)
            .bind(provider_id)
            .bind(applicant_id)
            .execute(&self.pool)
            .await?;

        info!(
            applicant_id = %applicant_id,
            provider = provider.as_str(),
            "Provider identity linked to applicant"
        );
        Ok(())
    }

    pub async fn update_applicant_profile(
        &self,
        id: &str,
        update: &ApplicantProfileUpdate,
    ) -> Result<ApplicantRecord, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE applicants
            SET name = COALESCE(?, name),
                profile_pic = COALESCE(?, profile_pic),
                heading = COALESCE(?, heading),
                description = COALESCE(?, description),
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.profile_pic.as_deref())
        .bind(update.heading.as_deref().map(str::trim))
        .bind(update.description.as_deref())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.find_applicant_by_id(id).await?.ok_or(StoreError::NotFound)
    }

    // ---- Role-generic writes usable inside a transaction ----

    /// Returns the number of accounts marked verified (0 when the email is unknown).
    pub async fn set_verified(
        &self,
        conn: &mut SqliteConnection,
        role: Role,
        email: &str,
    ) -> Result<u64, StoreError> {
        let sql = format!(
            "UPDATE {} SET is_verified = 1, updated_at = datetime('now') WHERE email = ?",
            role.table()
        );
        let result = sqlx::query(&sql)
            .bind(normalize_email(email))
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    /// Makes a password stored by `set_pending_password` the sign-in password.
    pub async fn promote_pending_password(
        &self,
        conn: &mut SqliteConnection,
        email: &str,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE applicants
            SET password_hash = pending_password_hash, pending_password_hash = NULL,
                updated_at = datetime('now')
            WHERE email = ? AND pending_password_hash IS NOT NULL AND password_hash IS NULL
            "#,
        )
        .bind(normalize_email(email))
        .execute(&mut *conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Hashes and stores a new password. Returns the number of accounts updated.
    pub async fn update_password(
        &self,
        conn: &mut SqliteConnection,
        role: Role,
        email: &str,
        plaintext: &str,
    ) -> Result<u64, StoreError> {
        let password_hash = hash_password(plaintext)?;
        let sql = format!(
            "UPDATE {} SET password_hash = ?, updated_at = datetime('now') WHERE email = ?",
            role.table()
        );
        let result = sqlx::query(&sql)
            .bind(&password_hash)
            .bind(normalize_email(email))
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }
}
