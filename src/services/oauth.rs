// src/services/oauth.rs
//! Google and LinkedIn authorization-code login.
//!
//! Both providers speak plain OAuth2 + an OpenID userinfo endpoint, so one
//! client parameterized by provider covers them.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::common::{safe_email_log, AppConfig};

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("{0} OAuth not configured")]
    NotConfigured(&'static str),

    #[error("OAuth flow failed: {0}")]
    OAuthFailed(String),

    #[error("Provider did not return an email address")]
    MissingEmail,

    #[error("Provider has not verified this email address")]
    UnverifiedEmail,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthProvider {
    Google,
    LinkedIn,
}

impl OAuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::LinkedIn => "linkedin",
        }
    }

    fn display_name(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "Google",
            OAuthProvider::LinkedIn => "LinkedIn",
        }
    }

    fn authorize_endpoint(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://accounts.google.com/o/oauth2/v2/auth",
            OAuthProvider::LinkedIn => "https://www.linkedin.com/oauth/v2/authorization",
        }
    }

    fn token_endpoint(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://oauth2.googleapis.com/token",
            OAuthProvider::LinkedIn => "https://www.linkedin.com/oauth/v2/accessToken",
        }
    }

    fn userinfo_endpoint(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "https://openidconnect.googleapis.com/v1/userinfo",
            OAuthProvider::LinkedIn => "https://api.linkedin.com/v2/userinfo",
        }
    }

    fn scopes(&self) -> &'static [&'static str] {
        match self {
            OAuthProvider::Google => &["openid", "email", "profile"],
            OAuthProvider::LinkedIn => &["openid", "profile", "email"],
        }
    }
}

/// Identity returned by a provider after a successful code exchange
#[derive(Debug, Clone)]
pub struct OAuthProfile {
    pub provider: OAuthProvider,
    pub provider_id: String,
    pub email: String,
    /// The provider's `email_verified` claim
    pub email_verified: bool,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
    pub scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn provider(&self) -> OAuthProvider;

    fn authorization_url(&self, state: Option<&str>) -> Result<String, OAuthError>;

    /// Exchanges an authorization code and resolves the user's identity
    async fn fetch_profile(&self, code: &str) -> Result<OAuthProfile, OAuthError>;
}

#[derive(Debug, Clone)]
pub struct OAuthClient {
    provider: OAuthProvider,
    client_id: Option<String>,
    client_secret: Option<String>,
    redirect_uri: String,
    http: Client,
}

impl OAuthClient {
    pub fn new(
        provider: OAuthProvider,
        client_id: Option<String>,
        client_secret: Option<String>,
        redirect_uri: String,
        http: Client,
    ) -> Self {
        Self {
            provider,
            client_id,
            client_secret,
            redirect_uri,
            http,
        }
    }

    pub fn google(config: &AppConfig, http: Client) -> Self {
        Self::new(
            OAuthProvider::Google,
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.google_redirect_uri.clone(),
            http,
        )
    }

    pub fn linkedin(config: &AppConfig, http: Client) -> Self {
        Self::new(
            OAuthProvider::LinkedIn,
            config.linkedin_client_id.clone(),
            config.linkedin_client_secret.clone(),
            config.linkedin_redirect_uri.clone(),
            http,
        )
    }

    fn credentials(&self) -> Result<(&str, &str), OAuthError> {
        match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => Ok((id.as_str(), secret.as_str())),
            _ => Err(OAuthError::NotConfigured(self.provider.display_name())),
        }
    }

    /// Exchange authorization code for tokens
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        let (client_id, client_secret) = self.credentials()?;

        let params = [
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!(provider = self.provider.as_str(), "Exchanging authorization code for tokens");

        let response = self
            .http
            .post(self.provider.token_endpoint())
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(
                provider = self.provider.as_str(),
                status = %status,
                error = %error_text,
                "Token exchange failed"
            );
            return Err(OAuthError::OAuthFailed(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| OAuthError::SerializationError(e.to_string()))
    }

    async fn fetch_userinfo(&self, access_token: &str) -> Result<UserInfo, OAuthError> {
        let response = self
            .http
            .get(self.provider.userinfo_endpoint())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(OAuthError::RequestFailed(format!(
                "Failed to get user info: HTTP {}",
                response.status()
            )));
        }

        response
            .json::<UserInfo>()
            .await
            .map_err(|e| OAuthError::SerializationError(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for OAuthClient {
    fn provider(&self) -> OAuthProvider {
        self.provider
    }

    fn authorization_url(&self, state: Option<&str>) -> Result<String, OAuthError> {
        let (client_id, _) = self.credentials()?;
        let scope_param = self.provider.scopes().join(" ");

        let mut auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            self.provider.authorize_endpoint(),
            urlencoding::encode(client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(&scope_param)
        );
        if self.provider == OAuthProvider::Google {
            auth_url.push_str("&prompt=select_account");
        }
        if let Some(state) = state {
            auth_url.push_str("&state=");
            auth_url.push_str(&urlencoding::encode(state));
        }

        Ok(auth_url)
    }

    async fn fetch_profile(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        let tokens = self.exchange_code(code).await?;
        let info = self.fetch_userinfo(&tokens.access_token).await?;

        let email = info
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or(OAuthError::MissingEmail)?;

        if info.email_verified != Some(true) {
            warn!(
                provider = self.provider.as_str(),
                email = %safe_email_log(&email),
                "Provider returned an unverified email"
            );
            return Err(OAuthError::UnverifiedEmail);
        }

        info!(
            provider = self.provider.as_str(),
            email = %safe_email_log(&email),
            "Resolved OAuth identity"
        );

        Ok(OAuthProfile {
            provider: self.provider,
            provider_id: info.sub,
            email,
            email_verified: true,
            name: info.name,
            picture: info.picture,
        })
    }
}

#[cfg(test)]
pub use fake::FakeIdentityProvider;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_authorization_url() {
        let client = OAuthClient::google(&AppConfig::for_tests(), Client::new());
        let auth_url = client.authorization_url(None).unwrap();

        assert!(auth_url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(auth_url.contains("client_id=google-client"));
        assert!(auth_url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fapi%2Fauth%2Fgoogle%2Fcallback"
        ));
        assert!(auth_url.contains("scope=openid%20email%20profile"));
        assert!(auth_url.contains("response_type=code"));
    }

    #[test]
    fn test_linkedin_authorization_url_with_state() {
        let client = OAuthClient::linkedin(&AppConfig::for_tests(), Client::new());
        let auth_url = client.authorization_url(Some("abc 123")).unwrap();

        assert!(auth_url.starts_with("https://www.linkedin.com/oauth/v2/authorization?"));
        assert!(auth_url.contains("client_id=linkedin-client"));
        assert!(auth_url.ends_with("&state=abc%20123"));
    }

    #[test]
    fn test_unconfigured_provider() {
        let client = OAuthClient::new(
            OAuthProvider::LinkedIn,
            None,
            None,
            "http://localhost:3000/auth/linkedin".to_string(),
            Client::new(),
        );
        assert!(matches!(
            client.authorization_url(None),
            Err(OAuthError::NotConfigured("LinkedIn"))
        ));
    }

    #[test]
    fn test_userinfo_email_verified_defaults_to_absent() {
        let info: UserInfo =
            serde_json::from_str(r#"{"sub":"123","email":"sam@mail.io"}"#).unwrap();
        assert_eq!(info.email_verified, None);

        let info: UserInfo = serde_json::from_str(
            r#"{"sub":"123","email":"sam@mail.io","email_verified":true}"#,
        )
        .unwrap();
        assert_eq!(info.email_verified, Some(true));
    }

    #[tokio::test]
    async fn test_unconfigured_exchange_fails_without_network() {
        let client = OAuthClient::new(
            OAuthProvider::Google,
            Some("id".to_string()),
            None,
            "http://localhost/cb".to_string(),
            Client::new(),
        );
        assert!(matches!(
            client.fetch_profile("code").await,
            Err(OAuthError::NotConfigured("Google"))
        ));
    }
}
