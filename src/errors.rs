use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::db::user_repository::InsertError;
use crate::responses::JsonResponse;
use crate::services::smtp_mailer::MailError;
use crate::utils::validation::FieldErrors;

pub const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired token";
pub const EMAIL_TAKEN_MESSAGE: &str = "Email already registered";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(FieldErrors),
    #[error("{0}")]
    Conflict(String),
    /// The email belongs to an account that never completed verification.
    #[error("email registered but not verified")]
    NeedsVerification,
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("{message}: {source}")]
    Delivery {
        message: String,
        #[source]
        source: MailError,
    },
    #[error("{0}")]
    Unauthorized(String),
    #[error("{message}")]
    Forbidden { message: String, code: &'static str },
    #[error("access denied, redirecting to {redirect_to}")]
    AccessDenied { redirect_to: &'static str },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    TooManyRequests(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(FieldErrors::single(field, message))
    }

    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        AppError::Internal(anyhow::anyhow!("{context}: {err}"))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Internal(anyhow::Error::new(err).context("database error"))
    }
}

impl From<InsertError> for AppError {
    fn from(err: InsertError) -> Self {
        match err {
            InsertError::DuplicateEmail => AppError::Conflict(EMAIL_TAKEN_MESSAGE.into()),
            InsertError::Database(err) => err.into(),
        }
    }
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => JsonResponse::validation("Validation failed", errors),
            AppError::Conflict(message) => JsonResponse::conflict(&message),
            AppError::NeedsVerification => JsonResponse::conflict_with_code(
                "Email registered but not verified. Check your inbox or request a new verification email.",
                "needs_verification",
            ),
            AppError::InvalidToken => {
                JsonResponse::bad_request_with_code(INVALID_TOKEN_MESSAGE, "invalid_token")
            }
            AppError::Delivery { message, source } => {
                tracing::warn!(error = %source, "email delivery failed");
                JsonResponse::bad_gateway_with_code(&message, "email_delivery_failed")
            }
            AppError::Unauthorized(message) => JsonResponse::unauthorized(&message),
            AppError::Forbidden { message, code } => {
                JsonResponse::forbidden_with_code(&message, code)
            }
            AppError::AccessDenied { redirect_to } => JsonResponse::forbidden_with_redirect(
                "You do not have access to this area",
                "access_denied",
                redirect_to,
            ),
            AppError::NotFound(message) => JsonResponse::not_found(&message),
            AppError::TooManyRequests(message) => JsonResponse::too_many_requests(&message),
            AppError::Internal(err) => {
                tracing::error!(error = ?err, "internal error");
                JsonResponse::server_error("Something went wrong. Please try again later.")
            }
        }
    }
}
