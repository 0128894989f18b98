// src/services/mailer.rs
//! OTP delivery seam. Real email delivery lives outside this service; the
//! default implementation only records the send in the logs.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::common::safe_email_log;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("OTP delivery failed: {0}")]
    Delivery(String),
}

pub fn otp_message(code: &str) -> String {
    format!("Your OTP is: {}. This code will expire in 5 minutes.", code)
}

#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_otp(&self, email: &str, code: &str) -> Result<(), MailError>;
}

/// Writes the OTP email to the log instead of sending it
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_otp(&self, email: &str, code: &str) -> Result<(), MailError> {
        info!(email = %safe_email_log(email), "📧 OTP email queued");
        debug!(email = %safe_email_log(email), body = %otp_message(code), "OTP email body");
        Ok(())
    }
}

#[cfg(test)]
pub use capture::CapturingMailer;
