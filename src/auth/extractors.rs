//! Authentication extractors for Axum

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::common::{safe_email_log, ApiError, AppState};
use crate::services::credentials::Role;

/// Authenticated caller extractor
///
/// Validates the `Authorization: Bearer <accessToken>` header against the
/// access secret. Tokens are self-contained, so no database lookup happens here.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub id: String,
    pub email: String,
    pub role: Role,
}

impl AuthedUser {
    pub fn require_employer(&self) -> Result<(), ApiError> {
        self.require(Role::Employer)
    }

    pub fn require_applicant(&self) -> Result<(), ApiError> {
        self.require(Role::Applicant)
    }

    fn require(&self, role: Role) -> Result<(), ApiError> {
        if self.role == role {
            Ok(())
        } else {
            warn!(
                user_id = %self.id,
                role = self.role.as_str(),
                required = role.as_str(),
                "Route not available for this account type"
            );
            Err(ApiError::Forbidden(format!(
                "This action is only available to {}s",
                role.as_str()
            )))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Extract the Extension containing the AppState
        let Extension(state_lock): Extension<Arc<RwLock<AppState>>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let app_state = state_lock.read().await.clone();

        let token = match parts.headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
            Some(t) => t.to_string(),
            None => {
                warn!("Authentication failed: missing Authorization header");
                return Err(ApiError::Unauthorized(
                    "Access denied. No token provided.".into(),
                ));
            }
        };

        // Handle "Bearer <token>" format or raw token
        let bare_token = token.strip_prefix("Bearer ").unwrap_or(&token).trim();

        let claims = app_state.auth.tokens().verify_access(bare_token).map_err(|e| {
            warn!(error = %e, "Access token validation failed");
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;

        debug!(
            user_id = %claims.sub,
            email = %safe_email_log(&claims.email),
            role = claims.role.as_str(),
            "Caller authenticated via extractor"
        );

        Ok(AuthedUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}
