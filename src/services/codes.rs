// src/services/codes.rs
//! Short-lived one-time codes: email OTPs and OAuth auth codes.

use chrono::Utc;
use rand::{rngs::OsRng, Rng, RngCore};
use sqlx::{SqliteConnection, SqlitePool};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::common::{normalize_email, safe_email_log, safe_token_log};

/// Lifetime of both OTPs and auth codes (5 minutes)
pub const CODE_TTL_SECS: i64 = 5 * 60;

#[derive(Debug, Error)]
pub enum CodeError {
    #[error("Invalid or expired code")]
    InvalidOrExpired,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct CodeStore {
    pool: SqlitePool,
    ttl_secs: i64,
}

impl CodeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_ttl(pool, CODE_TTL_SECS)
    }

    pub fn with_ttl(pool: SqlitePool, ttl_secs: i64) -> Self {
        Self { pool, ttl_secs }
    }

    fn expires_at(&self) -> i64 {
        Utc::now().timestamp() + self.ttl_secs
    }

    // ========================================================================
    // OTP
    // ========================================================================

    /// Issues a fresh 6-digit OTP, replacing any earlier one for the email.
    pub async fn issue_otp(&self, email: &str) -> Result<String, CodeError> {
        let email = normalize_email(email);
        let code = format!("{:06}", OsRng.gen_range(0..1_000_000u32));

        sqlx::query(
            r#"
            INSERT INTO otps (email, code, expires_at, created_at)
            VALUES (?, ?, ?, datetime('now'))
            ON CONFLICT(email) DO UPDATE SET
                code = excluded.code,
                expires_at = excluded.expires_at,
                created_at = excluded.created_at
            "#,
        )
        .bind(&email)
        .bind(&code)
        .bind(self.expires_at())
        .execute(&self.pool)
        .await?;

        debug!(email = %safe_email_log(&email), "OTP issued");
        Ok(code)
    }

    /// Consumes the OTP for `email` on the caller's connection so it can share
    /// a transaction with the account update that depends on it.
    pub async fn redeem_otp(
        &self,
        conn: &mut SqliteConnection,
        email: &str,
        code: &str,
    ) -> Result<(), CodeError> {
        let email = normalize_email(email);

        let row: Option<(i64,)> =
            sqlx::query_as("SELECT expires_at FROM otps WHERE email = ? AND code = ?")
                .bind(&email)
                .bind(code.trim())
                .fetch_optional(&mut *conn)
                .await?;

        let Some((expires_at,)) = row else {
            debug!(email = %safe_email_log(&email), "OTP not found");
            return Err(CodeError::InvalidOrExpired);
        };

        if expires_at < Utc::now().timestamp() {
            debug!(email = %safe_email_log(&email), "OTP expired");
            return Err(CodeError::InvalidOrExpired);
        }

        sqlx::query("DELETE FROM otps WHERE email = ?")
            .bind(&email)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    // ========================================================================
    // Auth codes
    // ========================================================================

    /// Issues a 16-byte hex auth code, replacing earlier codes for the applicant.
    pub async fn issue_auth_code(&self, applicant_id: &str) -> Result<String, CodeError> {
        let mut bytes = [0u8; 16];
        OsRng.fill_bytes(&mut bytes);
        let code = hex::encode(bytes);

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM auth_codes WHERE applicant_id = ?")
            .bind(applicant_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO auth_codes (code, applicant_id, expires_at) VALUES (?, ?, ?)")
            .bind(&code)
            .bind(applicant_id)
            .bind(self.expires_at())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(applicant_id = %applicant_id, code = %safe_token_log(&code), "Auth code issued");
        Ok(code)
    }

    /// Consumes an auth code and returns its applicant id.
    ///
    /// The lookup and the delete are one statement, so a code can be redeemed
    /// at most once even under concurrent requests.
    pub async fn redeem_auth_code(&self, code: &str) -> Result<String, CodeError> {
        let row: Option<(String, i64)> = sqlx::query_as(
            "DELETE FROM auth_codes WHERE code = ? RETURNING applicant_id, expires_at",
        )
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some((applicant_id, expires_at)) if expires_at >= Utc::now().timestamp() => {
                Ok(applicant_id)
            }
            Some(_) => {
                debug!(code = %safe_token_log(code), "Auth code expired");
                Err(CodeError::InvalidOrExpired)
            }
            None => Err(CodeError::InvalidOrExpired),
        }
    }

    // ========================================================================
    // Expiry sweep
    // ========================================================================

    /// Deletes expired OTPs and auth codes. Returns the number of rows removed.
    pub async fn sweep_expired(&self) -> Result<u64, CodeError> {
        let now = Utc::now().timestamp();

        let otps = sqlx::query("DELETE FROM otps WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        let auth_codes = sqlx::query("DELETE FROM auth_codes WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(otps + auth_codes)
    }
}

/// Periodically removes expired codes. Redemption checks expiry itself, so the
/// sweep only keeps the tables small.
pub fn spawn_expiry_sweeper(store: CodeStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.sweep_expired().await {
                Ok(0) => {}
                Ok(removed) => info!(removed = removed, "Swept expired one-time codes"),
                Err(e) => error!(error = %e, "Failed to sweep expired one-time codes"),
            }
        }
    })
}
