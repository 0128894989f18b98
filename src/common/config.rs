// src/common/config.rs
//! Environment-driven application configuration

use std::env;
use tracing::warn;

/// Lifetime of the refresh token and of the cookie carrying it (7 days).
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

const DEV_JWT_SECRET: &str = "replace_with_strong_secret";
const DEV_REFRESH_SECRET: &str = "replace_with_strong_refresh_secret";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub refresh_secret: String,
    pub access_token_ttl_secs: i64,
    pub frontend_url: String,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_uri: String,
    pub linkedin_client_id: Option<String>,
    pub linkedin_client_secret: Option<String>,
    pub linkedin_redirect_uri: String,
    pub cors_origins: Vec<String>,
    pub cookie_secure: bool,
    pub code_sweep_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(5000);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using development secret");
            DEV_JWT_SECRET.to_string()
        });
        let refresh_secret = env::var("REFRESH_SECRET").unwrap_or_else(|_| {
            warn!("REFRESH_SECRET not set, using development secret");
            DEV_REFRESH_SECRET.to_string()
        });

        let frontend_url = env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        // AUTH_REDIRECT_URI is a path fragment appended to the frontend url, e.g. "auth/"
        let auth_redirect = env::var("AUTH_REDIRECT_URI").unwrap_or_else(|_| "auth/".to_string());
        let linkedin_redirect_uri = format!(
            "{}/{}linkedin",
            frontend_url,
            auth_redirect.trim_start_matches('/')
        );

        let google_redirect_uri = env::var("GOOGLE_REDIRECT_URI")
            .unwrap_or_else(|_| format!("http://localhost:{}/api/auth/google/callback", port));

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| frontend_url.clone())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://looking2hire.db".to_string()),
            port,
            jwt_secret,
            refresh_secret,
            access_token_ttl_secs: parse_env("ACCESS_TOKEN_TTL_SECS", 3600),
            frontend_url,
            google_client_id: non_empty_env("GOOGLE_CLIENT_ID"),
            google_client_secret: non_empty_env("GOOGLE_CLIENT_SECRET"),
            google_redirect_uri,
            linkedin_client_id: non_empty_env("LINKEDIN_CLIENT_ID"),
            linkedin_client_secret: non_empty_env("LINKEDIN_CLIENT_SECRET"),
            linkedin_redirect_uri,
            cors_origins,
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            code_sweep_interval_secs: parse_env("CODE_SWEEP_INTERVAL_SECS", 60),
        }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
impl AppConfig {
    /// Deterministic configuration for tests; never reads the environment.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 5000,
            jwt_secret: "test_access_secret".to_string(),
            refresh_secret: "test_refresh_secret".to_string(),
            access_token_ttl_secs: 3600,
            frontend_url: "http://localhost:3000".to_string(),
            google_client_id: Some("google-client".to_string()),
            google_client_secret: Some("google-secret".to_string()),
            google_redirect_uri: "http://localhost:5000/api/auth/google/callback".to_string(),
            linkedin_client_id: Some("linkedin-client".to_string()),
            linkedin_client_secret: Some("linkedin-secret".to_string()),
            linkedin_redirect_uri: "http://localhost:3000/auth/linkedin".to_string(),
            cors_origins: vec!["http://localhost:3000".to_string()],
            cookie_secure: true,
            code_sweep_interval_secs: 60,
        }
    }
}
