// src/services/mod.rs
//
// Shared services: account storage, one-time codes, tokens and the auth
// orchestrator built on top of them

pub mod auth;
pub mod codes;
pub mod credentials;
pub mod mailer;
pub mod oauth;
pub mod rate_limit;
pub mod tokens;

// Re-export commonly used types for convenience
pub use auth::{AuthError, AuthService};
pub use codes::CodeStore;
pub use credentials::{CredentialStore, Role};
pub use mailer::{LogMailer, OtpMailer};
pub use oauth::{IdentityProvider, OAuthClient, OAuthProvider};
pub use rate_limit::RateLimitService;
pub use tokens::TokenIssuer;
