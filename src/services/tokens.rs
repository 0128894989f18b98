// src/services/tokens.rs
//! JWT access and refresh tokens (HS256, separate secrets)

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use crate::common::config::REFRESH_TOKEN_TTL_SECS;
use crate::services::credentials::Role;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Invalid or expired token")]
    Invalid,

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

/// JWT claims carried by both token kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// The account a token is issued for
#[derive(Debug, Clone)]
pub struct TokenSubject {
    pub id: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenIssuer {
    access_secret: String,
    refresh_secret: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(access_secret: &str, refresh_secret: &str, access_ttl_secs: i64) -> Self {
        Self::with_refresh_ttl(
            access_secret,
            refresh_secret,
            access_ttl_secs,
            REFRESH_TOKEN_TTL_SECS,
        )
    }

    pub fn with_refresh_ttl(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        Self {
            access_secret: access_secret.to_string(),
            refresh_secret: refresh_secret.to_string(),
            access_ttl_secs,
            refresh_ttl_secs,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    pub fn issue_access_token(&self, subject: &TokenSubject) -> Result<String, TokenError> {
        sign(subject, &self.access_secret, self.access_ttl_secs)
    }

    pub fn issue_refresh_token(&self, subject: &TokenSubject) -> Result<String, TokenError> {
        sign(subject, &self.refresh_secret, self.refresh_ttl_secs)
    }

    pub fn issue_pair(&self, subject: &TokenSubject) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(subject)?,
            refresh_token: self.issue_refresh_token(subject)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        verify(token, &self.access_secret)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        verify(token, &self.refresh_secret)
    }

    /// Mints a new access token from a valid refresh token. The refresh token is not rotated.
    pub fn refresh(&self, refresh_token: &str) -> Result<String, TokenError> {
        let claims = self.verify_refresh(refresh_token)?;
        self.issue_access_token(&TokenSubject {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

fn sign(subject: &TokenSubject, secret: &str, ttl_secs: i64) -> Result<String, TokenError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: subject.id.clone(),
        email: subject.email.clone(),
        role: subject.role,
        iat: now,
        exp: now + ttl_secs,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %subject.id, "JWT encoding error");
        TokenError::Encoding(e.to_string())
    })
}

fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        debug!(error = %e, "JWT validation failed");
        TokenError::Invalid
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> TokenSubject {
        TokenSubject {
            id: "AP_K7NP3X".to_string(),
            email: "sam@mail.io".to_string(),
            role: Role::Applicant,
        }
    }

    #[test]
    fn test_access_token_claims() {
        let issuer = TokenIssuer::new("access", "refresh", 3600);
        let token = issuer.issue_access_token(&subject()).unwrap();
        let claims = issuer.verify_access(&token).unwrap();

        assert_eq!(claims.sub, "AP_K7NP3X");
        assert_eq!(claims.role, Role::Applicant);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_secrets_are_not_interchangeable() {
        let issuer = TokenIssuer::new("access", "refresh", 3600);
        let pair = issuer.issue_pair(&subject()).unwrap();

        assert!(matches!(
            issuer.verify_access(&pair.refresh_token),
            Err(TokenError::Invalid)
        ));
        assert!(matches!(
            issuer.verify_refresh(&pair.access_token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_refresh_issues_verifiable_access_token() {
        let issuer = TokenIssuer::new("access", "refresh", 3600);
        let refresh_token = issuer.issue_refresh_token(&subject()).unwrap();

        let access = issuer.refresh(&refresh_token).unwrap();
        let claims = issuer.verify_access(&access).unwrap();
        assert_eq!(claims.email, "sam@mail.io");
    }

    #[test]
    fn test_expired_refresh_token_rejected() {
        let issuer = TokenIssuer::with_refresh_ttl("access", "refresh", 3600, -120);
        let refresh_token = issuer.issue_refresh_token(&subject()).unwrap();

        assert!(matches!(issuer.refresh(&refresh_token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let issuer = TokenIssuer::new("access", "refresh", 3600);
        assert!(issuer.verify_access("not.a.jwt").is_err());
        assert!(issuer.verify_access("").is_err());
    }
}
