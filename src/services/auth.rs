// src/services/auth.rs
//! Account lifecycle orchestration: signup, OTP verification, signin, OAuth
//! login and token exchange.
//!
//! Accounts move `Unregistered -> PendingVerification -> Verified`. Password
//! signups stop at `PendingVerification` until the emailed OTP is redeemed;
//! provider logins land directly in `Verified` with no password.

use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::common::{normalize_email, safe_email_log};
use crate::services::codes::{CodeError, CodeStore};
use crate::services::credentials::{
    verify_password, Applicant, ApplicantProfileUpdate, ApplicantRecord, CredentialStore,
    Employer, EmployerProfileUpdate, EmployerRecord, NewApplicant, NewEmployer, Role, StoreError,
};
use crate::services::mailer::{MailError, OtpMailer};
use crate::services::oauth::{OAuthError, OAuthProfile};
use crate::services::tokens::{TokenError, TokenIssuer, TokenPair, TokenSubject};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    DuplicateRole(String),

    #[error("{0}")]
    AlreadyRegistered(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not verified")]
    NotVerified,

    #[error("Invalid or expired auth code")]
    InvalidOrExpiredCode,

    #[error("Invalid or expired OTP")]
    InvalidOrExpiredOtp,

    #[error("Invalid or expired refresh token")]
    InvalidOrExpiredRefreshToken,

    #[error("{0}")]
    ContextNotAllowed(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Provider(#[from] OAuthError),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("{0}")]
    Unexpected(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Database(e)
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => AuthError::AlreadyRegistered(e.to_string()),
            StoreError::RoleConflict => AuthError::DuplicateRole(e.to_string()),
            StoreError::NotFound => AuthError::NotFound("User details not found".to_string()),
            StoreError::Hashing(msg) => AuthError::Unexpected(msg),
            StoreError::Database(db) => AuthError::Database(db),
        }
    }
}

impl From<CodeError> for AuthError {
    fn from(e: CodeError) -> Self {
        match e {
            CodeError::InvalidOrExpired => AuthError::InvalidOrExpiredCode,
            CodeError::Database(db) => AuthError::Database(db),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Invalid => AuthError::InvalidOrExpiredRefreshToken,
            TokenError::Encoding(msg) => AuthError::Unexpected(msg),
        }
    }
}

impl From<MailError> for AuthError {
    fn from(e: MailError) -> Self {
        error!(error = %e, "Failed to send OTP email");
        AuthError::Unexpected("Failed to send OTP email. Please try again later.".to_string())
    }
}

/// Why an OTP was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OtpContext {
    Signup,
    ForgotPassword,
}

impl OtpContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpContext::Signup => "signup",
            OtpContext::ForgotPassword => "forgot-password",
        }
    }
}

/// An account as returned to clients; never includes password material
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Account {
    Employer(Employer),
    Applicant(Applicant),
}

impl Account {
    pub fn id(&self) -> &str {
        match self {
            Account::Employer(e) => &e.id,
            Account::Applicant(a) => &a.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Account::Employer(e) => &e.email,
            Account::Applicant(a) => &a.email,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Account::Employer(_) => Role::Employer,
            Account::Applicant(_) => Role::Applicant,
        }
    }
}

/// Result of a successful signin or auth-code exchange
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub tokens: TokenPair,
    pub account: Account,
}

#[derive(Debug, Clone)]
pub struct OtpVerification {
    pub email: String,
    pub otp_code: String,
    pub context: OtpContext,
    pub role: Role,
    pub new_password: Option<String>,
}

#[derive(Clone)]
pub struct AuthService {
    credentials: CredentialStore,
    codes: CodeStore,
    tokens: TokenIssuer,
    mailer: Arc<dyn OtpMailer>,
}

impl AuthService {
    pub fn new(
        credentials: CredentialStore,
        codes: CodeStore,
        tokens: TokenIssuer,
        mailer: Arc<dyn OtpMailer>,
    ) -> Self {
        Self {
            credentials,
            codes,
            tokens,
            mailer,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn codes(&self) -> &CodeStore {
        &self.codes
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    // ========================================================================
    // Signup
    // ========================================================================

    pub async fn employer_signup(&self, new: NewEmployer) -> Result<String, AuthError> {
        let email = normalize_email(&new.email);

        if self.credentials.find_applicant_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateRole(
                "This email is already registered as an applicant".to_string(),
            ));
        }

        let existing = self
            .credentials
            .find_employer_by_email_or_phone(Some(email.as_str()), Some(new.phone.as_str()))
            .await?;

        let employer = match existing {
            Some(record) => reuse_pending_employer(record, &email)?,
            None => match self.credentials.create_employer(&new).await {
                Ok(record) => record,
                // Lost a race against a concurrent signup; apply the same rules to the winner
                Err(StoreError::Duplicate(field)) => {
                    let winner = self
                        .credentials
                        .find_employer_by_email_or_phone(Some(email.as_str()), Some(new.phone.as_str()))
                        .await?
                        .ok_or(StoreError::Duplicate(field))?;
                    reuse_pending_employer(winner, &email)?
                }
                Err(e) => return Err(e.into()),
            },
        };

        self.deliver_otp(&employer.email, OtpContext::Signup).await
    }

    pub async fn applicant_signup(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
    ) -> Result<String, AuthError> {
        let email = normalize_email(email);

        if self.credentials.find_employer_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateRole(
                "This email is already registered as an employer".to_string(),
            ));
        }

        let applicant = match self.credentials.find_applicant_by_email(&email).await? {
            Some(record) => reuse_pending_applicant(record)?,
            None => {
                let created = self
                    .credentials
                    .create_applicant(&NewApplicant {
                        email: email.clone(),
                        name,
                        password: Some(password.to_string()),
                        ..Default::default()
                    })
                    .await;
                match created {
                    Ok(record) => record,
                    Err(StoreError::Duplicate(field)) => {
                        let winner = self
                            .credentials
                            .find_applicant_by_email(&email)
                            .await?
                            .ok_or(StoreError::Duplicate(field))?;
                        reuse_pending_applicant(winner)?
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        self.deliver_otp(&applicant.email, OtpContext::Signup).await
    }

    /// Adds a password to an applicant created through a provider login.
    /// The password becomes usable once the signup OTP sent here is verified.
    pub async fn link_password(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let applicant = self
            .credentials
            .find_applicant_by_email(email)
            .await?
            .ok_or_else(|| AuthError::NotFound("User not found.".to_string()))?;

        if !applicant.is_oauth_linked() {
            return Err(AuthError::ContextNotAllowed(
                "User has not previously signed up.".to_string(),
            ));
        }

        let already_has_password = || {
            AuthError::ContextNotAllowed("User already has a password. Try logging in.".to_string())
        };
        if applicant.password_hash.is_some() {
            return Err(already_has_password());
        }
        if !self
            .credentials
            .set_pending_password(&applicant.id, password)
            .await?
        {
            return Err(already_has_password());
        }

        info!(applicant_id = %applicant.id, "Password pending link for provider account");
        self.deliver_otp(&applicant.email, OtpContext::Signup).await
    }

    // ========================================================================
    // OTP
    // ========================================================================

    pub async fn send_otp(
        &self,
        email: &str,
        context: OtpContext,
        role: Role,
    ) -> Result<String, AuthError> {
        let (exists, verified, pending_link) = match role {
            Role::Employer => match self.credentials.find_employer_by_email(email).await? {
                Some(e) => (true, e.is_verified, false),
                None => (false, false, false),
            },
            Role::Applicant => match self.credentials.find_applicant_by_email(email).await? {
                Some(a) => (true, a.is_verified, a.pending_password_hash.is_some()),
                None => (false, false, false),
            },
        };

        if !exists {
            return Err(AuthError::NotFound("User does not exist".to_string()));
        }
        match context {
            // A provider account linking a password verifies it through the signup context
            OtpContext::Signup if verified && !pending_link => {
                return Err(AuthError::ContextNotAllowed(
                    "User is already verified".to_string(),
                ))
            }
            OtpContext::ForgotPassword if !verified => {
                return Err(AuthError::ContextNotAllowed(
                    "User is not registered yet".to_string(),
                ))
            }
            _ => {}
        }

        self.deliver_otp(email, context).await
    }

    async fn deliver_otp(&self, email: &str, context: OtpContext) -> Result<String, AuthError> {
        let code = self.codes.issue_otp(email).await?;
        self.mailer.send_otp(&normalize_email(email), &code).await?;

        info!(
            email = %safe_email_log(email),
            context = context.as_str(),
            "OTP sent"
        );
        Ok(format!("OTP resent for {} successfully", context.as_str()))
    }

    /// Redeems the OTP and applies its effect in one transaction. On any
    /// failure the OTP stays redeemable and the account is unchanged.
    pub async fn verify_otp(&self, request: &OtpVerification) -> Result<String, AuthError> {
        let mut tx = self.credentials.pool().begin().await?;

        match self.apply_otp(&mut tx, request).await {
            Ok(()) => {
                tx.commit().await?;
                info!(
                    email = %safe_email_log(&request.email),
                    context = request.context.as_str(),
                    role = request.role.as_str(),
                    "OTP verified"
                );
                Ok("OTP Verified successfully".to_string())
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    error!(error = %rollback_err, "Failed to roll back OTP verification");
                }
                warn!(
                    email = %safe_email_log(&request.email),
                    error = %e,
                    "OTP verification rolled back"
                );
                Err(e)
            }
        }
    }

    async fn apply_otp(
        &self,
        conn: &mut SqliteConnection,
        request: &OtpVerification,
    ) -> Result<(), AuthError> {
        self.codes
            .redeem_otp(&mut *conn, &request.email, &request.otp_code)
            .await
            .map_err(|e| match e {
                CodeError::InvalidOrExpired => AuthError::InvalidOrExpiredOtp,
                CodeError::Database(db) => AuthError::Database(db),
            })?;

        let updated = match request.context {
            OtpContext::Signup => {
                let updated = self
                    .credentials
                    .set_verified(&mut *conn, request.role, &request.email)
                    .await?;
                if request.role == Role::Applicant {
                    self.credentials
                        .promote_pending_password(&mut *conn, &request.email)
                        .await?;
                }
                updated
            }
            OtpContext::ForgotPassword => {
                let new_password = request.new_password.as_deref().ok_or_else(|| {
                    AuthError::Validation("newPassword is required to reset a password".to_string())
                })?;
                self.credentials
                    .update_password(&mut *conn, request.role, &request.email, new_password)
                    .await?
            }
        };

        if updated == 0 {
            return Err(AuthError::NotFound("User details not found".to_string()));
        }
        Ok(())
    }

    // ========================================================================
    // Signin
    // ========================================================================

    pub async fn employer_signin(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        password: &str,
    ) -> Result<SignedIn, AuthError> {
        let employer = self
            .credentials
            .find_employer_by_email_or_phone(email, phone)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, employer.password_hash.as_deref()) {
            warn!(employer_id = %employer.id, "Employer signin with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        if !employer.is_verified {
            return Err(AuthError::NotVerified);
        }

        self.sign_in(Account::Employer(employer.into()))
    }

    pub async fn applicant_signin(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignedIn, AuthError> {
        let applicant = self
            .credentials
            .find_applicant_by_email(email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, applicant.password_hash.as_deref()) {
            warn!(applicant_id = %applicant.id, "Applicant signin with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        if !applicant.is_verified {
            return Err(AuthError::NotVerified);
        }

        self.sign_in(Account::Applicant(applicant.into()))
    }

    fn sign_in(&self, account: Account) -> Result<SignedIn, AuthError> {
        let subject = TokenSubject {
            id: account.id().to_string(),
            email: account.email().to_string(),
            role: account.role(),
        };
        let tokens = self.tokens.issue_pair(&subject)?;

        info!(user_id = %subject.id, role = subject.role.as_str(), "Signed in");
        Ok(SignedIn { tokens, account })
    }

    // ========================================================================
    // OAuth
    // ========================================================================

    /// Resolves a provider identity to an applicant and issues a one-time
    /// auth code for it.
    pub async fn oauth_login(&self, profile: &OAuthProfile) -> Result<String, AuthError> {
        if !profile.email_verified {
            return Err(OAuthError::UnverifiedEmail.into());
        }
        let email = normalize_email(&profile.email);

        if self.credentials.find_employer_by_email(&email).await?.is_some() {
            return Err(AuthError::DuplicateRole(
                "This email is registered as an employer".to_string(),
            ));
        }

        let applicant = match self.credentials.find_applicant_by_email(&email).await? {
            Some(existing) => self.attach_provider(existing, profile).await?,
            None => {
                let created = self
                    .credentials
                    .create_applicant(&NewApplicant {
                        email: email.clone(),
                        name: profile.name.clone(),
                        password: None,
                        provider: Some((profile.provider, profile.provider_id.clone())),
                        profile_pic: profile.picture.clone(),
                        is_verified: true,
                    })
                    .await;
                match created {
                    Ok(record) => record,
                    Err(StoreError::Duplicate(field)) => {
                        let winner = self
                            .credentials
                            .find_applicant_by_email(&email)
                            .await?
                            .ok_or(StoreError::Duplicate(field))?;
                        self.attach_provider(winner, profile).await?
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let code = self.codes.issue_auth_code(&applicant.id).await?;
        info!(
            applicant_id = %applicant.id,
            provider = profile.provider.as_str(),
            "OAuth login resolved, auth code issued"
        );
        Ok(code)
    }

    async fn attach_provider(
        &self,
        existing: ApplicantRecord,
        profile: &OAuthProfile,
    ) -> Result<ApplicantRecord, AuthError> {
        match existing.provider_id(profile.provider) {
            Some(linked) if linked != profile.provider_id => {
                return Err(AuthError::AlreadyRegistered(format!(
                    "This email is linked to a different {} account",
                    profile.provider.as_str()
                )));
            }
            Some(_) => {}
            None => {
                self.credentials
                    .link_provider(&existing.id, profile.provider, &profile.provider_id)
                    .await?
            }
        }

        // Only verified provider emails reach here
        if !existing.is_verified {
            self.credentials.verify_through_provider(&existing.id).await?;
        }

        Ok(existing)
    }

    /// Redeems an auth code for a token pair. A code works once.
    pub async fn exchange_auth_code(&self, code: &str) -> Result<SignedIn, AuthError> {
        let applicant_id = self.codes.redeem_auth_code(code).await?;

        let applicant = self
            .credentials
            .find_applicant_by_id(&applicant_id)
            .await?
            .ok_or_else(|| AuthError::NotFound("User details not found".to_string()))?;

        self.sign_in(Account::Applicant(applicant.into()))
    }

    // ========================================================================
    // Tokens
    // ========================================================================

    pub fn refresh(&self, refresh_token: Option<&str>) -> Result<String, AuthError> {
        let token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidOrExpiredRefreshToken)?;
        Ok(self.tokens.refresh(token)?)
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    pub async fn account_details(&self, id: &str, role: Role) -> Result<Account, AuthError> {
        let not_found = || AuthError::NotFound(format!("{} not found", role.as_str()));
        match role {
            Role::Employer => self
                .credentials
                .find_employer_by_id(id)
                .await?
                .map(|e| Account::Employer(e.into()))
                .ok_or_else(not_found),
            Role::Applicant => self
                .credentials
                .find_applicant_by_id(id)
                .await?
                .map(|a| Account::Applicant(a.into()))
                .ok_or_else(not_found),
        }
    }

    /// Public views of every account, employers and applicants separately
    pub async fn all_accounts(&self) -> Result<(Vec<Employer>, Vec<Applicant>), AuthError> {
        let employers = self.credentials.all_employers().await?;
        let applicants = self.credentials.all_applicants().await?;
        Ok((
            employers.into_iter().map(Employer::from).collect(),
            applicants.into_iter().map(Applicant::from).collect(),
        ))
    }

    pub async fn employer_public(&self, id: &str) -> Result<Employer, AuthError> {
        self.credentials
            .find_employer_by_id(id)
            .await?
            .map(Employer::from)
            .ok_or_else(|| AuthError::NotFound("Employer not found".to_string()))
    }

    pub async fn update_employer_profile(
        &self,
        id: &str,
        update: &EmployerProfileUpdate,
    ) -> Result<Employer, AuthError> {
        let record = self.credentials.update_employer_profile(id, update).await?;
        info!(employer_id = %id, "Employer profile updated");
        Ok(record.into())
    }

    pub async fn update_applicant_profile(
        &self,
        id: &str,
        update: &ApplicantProfileUpdate,
    ) -> Result<Applicant, AuthError> {
        let record = self.credentials.update_applicant_profile(id, update).await?;
        info!(applicant_id = %id, "Applicant profile updated");
        Ok(record.into())
    }
}

/// An unverified employer may sign up again; the OTP is simply re-sent.
fn reuse_pending_employer(
    existing: EmployerRecord,
    email: &str,
) -> Result<EmployerRecord, AuthError> {
    if existing.is_verified {
        return Err(AuthError::AlreadyRegistered(
            "User already exists. Email or Phone Number already registered".to_string(),
        ));
    }
    // Matched on phone only: the number belongs to someone else's pending signup
    if existing.email != email {
        return Err(AuthError::AlreadyRegistered(
            "Phone number already registered".to_string(),
        ));
    }
    Ok(existing)
}

fn reuse_pending_applicant(existing: ApplicantRecord) -> Result<ApplicantRecord, AuthError> {
    if existing.is_oauth_linked() && existing.password_hash.is_none() {
        return Err(AuthError::AlreadyRegistered(
            "Please link existing account.".to_string(),
        ));
    }
    if existing.is_verified {
        return Err(AuthError::AlreadyRegistered(
            "User already exists. Email already registered.".to_string(),
        ));
    }
    Ok(existing)
}
