// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::AppConfig;
use crate::services::{
    AuthService, CodeStore, CredentialStore, IdentityProvider, OAuthClient, OtpMailer,
    RateLimitService, TokenIssuer,
};

/// Application state containing database pool, services, and configuration
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub http: Client,
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
    pub google: Arc<dyn IdentityProvider>,
    pub linkedin: Arc<dyn IdentityProvider>,
    pub rate_limit_service: Arc<RateLimitService>,
}

impl AppState {
    /// Wires the production services: real OAuth clients over a shared HTTP client
    pub fn new(
        db: SqlitePool,
        config: AppConfig,
        mailer: Arc<dyn OtpMailer>,
        rate_limit_service: Arc<RateLimitService>,
    ) -> Self {
        let http = Client::new();
        let google: Arc<dyn IdentityProvider> = Arc::new(OAuthClient::google(&config, http.clone()));
        let linkedin: Arc<dyn IdentityProvider> =
            Arc::new(OAuthClient::linkedin(&config, http.clone()));

        Self::with_providers(db, http, config, mailer, google, linkedin, rate_limit_service)
    }

    pub fn with_providers(
        db: SqlitePool,
        http: Client,
        config: AppConfig,
        mailer: Arc<dyn OtpMailer>,
        google: Arc<dyn IdentityProvider>,
        linkedin: Arc<dyn IdentityProvider>,
        rate_limit_service: Arc<RateLimitService>,
    ) -> Self {
        let tokens = TokenIssuer::new(
            &config.jwt_secret,
            &config.refresh_secret,
            config.access_token_ttl_secs,
        );
        let auth = AuthService::new(
            CredentialStore::new(db.clone()),
            CodeStore::new(db.clone()),
            tokens,
            mailer,
        );

        Self {
            db,
            http,
            config: Arc::new(config),
            auth: Arc::new(auth),
            google,
            linkedin,
            rate_limit_service,
        }
    }
}
