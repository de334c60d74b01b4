use async_trait::async_trait;
use std::fmt;

use lettre::address::AddressError;
use lettre::transport::smtp::Error as SmtpError;

use crate::services::email_templates::{self, MailContext};

#[derive(Debug)]
pub enum MailError {
    Other(String),
    InvalidEmailAddress(String),
    SendError(String),
    EnvVarMissing(String),
    /// The provider refused the message outright; resending will not help.
    Rejected(String),
}

impl MailError {
    /// Transport hiccups are worth another attempt; configuration and
    /// addressing problems are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, MailError::SendError(_))
    }
}

impl fmt::Display for MailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MailError::Other(e) => write!(f, "Error: {}", e),
            MailError::InvalidEmailAddress(e) => write!(f, "Invalid Address: {}", e),
            MailError::SendError(e) => write!(f, "Send error: {}", e),
            MailError::EnvVarMissing(e) => write!(f, "Env Var Missing: {}", e),
            MailError::Rejected(e) => write!(f, "Rejected: {}", e),
        }
    }
}

impl std::error::Error for MailError {}

impl From<SmtpError> for MailError {
    fn from(err: SmtpError) -> Self {
        if err.is_permanent() {
            MailError::Rejected(err.to_string())
        } else {
            MailError::SendError(err.to_string())
        }
    }
}

impl From<lettre::error::Error> for MailError {
    fn from(err: lettre::error::Error) -> Self {
        MailError::Other(err.to_string())
    }
}

impl From<AddressError> for MailError {
    fn from(e: AddressError) -> Self {
        MailError::InvalidEmailAddress(e.to_string())
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    fn context(&self) -> &MailContext;

    /// Sends an HTML message.
    async fn send_email_generic(&self, to: &str, subject: &str, html: &str)
        -> Result<(), MailError>;

    async fn send_verification_email(
        &self,
        to: &str,
        name: &str,
        token: &str,
    ) -> Result<(), MailError> {
        let url = self.context().verification_url(token);
        let email = email_templates::verification_email(name, &url);
        self.send_email_generic(to, &email.subject, &email.html)
            .await
    }

    async fn send_reset_email(&self, to: &str, name: &str, token: &str) -> Result<(), MailError> {
        let ctx = self.context();
        let url = ctx.reset_url(token);
        let email = email_templates::reset_email(name, &url, ctx.reset_ttl);
        self.send_email_generic(to, &email.subject, &email.html)
            .await
    }
}

#[cfg(test)]
mod mock_mailer;
mod smtp_impl;

#[cfg(test)]
pub use mock_mailer::MockMailer;
pub use smtp_impl::{SmtpMailer, SmtpSettings};
