use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use super::{EmailAvailability, RegistrationSubmitter, SubmissionReceipt};
use crate::models::signup::BusinessSignupPayload;
use crate::utils::validation::FieldErrors;

const FALLBACK_MESSAGE: &str = "Registration failed. Please try again.";

#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The server answered with an error body.
    #[error("{message}")]
    Rejected {
        status: u16,
        /// Machine-readable reason, e.g. `needs_verification`.
        code: Option<String>,
        message: String,
        field_errors: FieldErrors,
    },
    #[error("registration request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response from registration service")]
    InvalidResponse,
}

impl SubmissionError {
    /// Text suitable for showing next to the form.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Rejected { message, .. } => message.clone(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    /// The email belongs to an account still waiting on verification, so
    /// the caller should offer a resend rather than a login.
    pub fn needs_verification(&self) -> bool {
        matches!(
            self,
            SubmissionError::Rejected { code: Some(code), .. } if code == "needs_verification"
        )
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    errors: Option<FieldErrors>,
}

#[derive(Deserialize)]
struct CheckEmailBody {
    exists: bool,
}

/// Talks to the registration endpoints over HTTP.
#[derive(Clone)]
pub struct HttpRegistrationClient {
    base_url: String,
    http: Client,
}

impl HttpRegistrationClient {
    pub fn new(http: &Client, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: http.clone(),
        }
    }

    async fn rejection(resp: reqwest::Response) -> SubmissionError {
        let status = resp.status().as_u16();
        let body = resp.json::<ErrorBody>().await.ok();
        let (message, code, field_errors) = match body {
            Some(ErrorBody {
                message,
                code,
                errors,
            }) => (
                message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
                code,
                errors.unwrap_or_default(),
            ),
            None => (FALLBACK_MESSAGE.to_string(), None, FieldErrors::new()),
        };

        SubmissionError::Rejected {
            status,
            code,
            message,
            field_errors,
        }
    }
}

#[async_trait]
impl RegistrationSubmitter for HttpRegistrationClient {
    async fn submit(
        &self,
        payload: &BusinessSignupPayload,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let resp = self
            .http
            .post(format!("{}/api/auth/register/business", self.base_url))
            .json(payload)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        resp.json::<SubmissionReceipt>()
            .await
            .map_err(|_| SubmissionError::InvalidResponse)
    }
}

#[async_trait]
impl EmailAvailability for HttpRegistrationClient {
    async fn email_exists(&self, email: &str) -> Result<bool, SubmissionError> {
        let resp = self
            .http
            .get(format!("{}/api/check-email", self.base_url))
            .query(&[("email", email)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::rejection(resp).await);
        }

        let body = resp
            .json::<CheckEmailBody>()
            .await
            .map_err(|_| SubmissionError::InvalidResponse)?;
        Ok(body.exists)
    }
}
