//! Email verification and password reset.
//!
//! Raw tokens only travel inside email links. Every lookup re-hashes the
//! incoming value, and both consuming operations are single conditional
//! updates so a replayed token loses the race.

use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::{EmailVerificationStatus, User};
use crate::state::AppState;
use crate::utils::password::{hash_password, password_policy_violation};
use crate::utils::token::{generate_token, hash_token};
use crate::utils::validation::{is_valid_email, normalize_email};

/// Sends the verification email and records the outcome on the account.
pub(crate) async fn deliver_verification(
    state: &AppState,
    user: &User,
    raw_token: &str,
    failure_message: &str,
) -> Result<(), AppError> {
    let outcome = state
        .mailer
        .send_verification_email(&user.email, user.display_name(), raw_token)
        .await;

    let status = match outcome {
        Ok(()) => EmailVerificationStatus::Sent,
        Err(_) => EmailVerificationStatus::Failed,
    };
    if let Err(err) = state.db.set_verification_status(user.id, status).await {
        warn!(user_id = %user.id, ?err, "failed to record verification email status");
    }

    outcome.map_err(|source| AppError::Delivery {
        message: failure_message.to_string(),
        source,
    })
}

pub async fn verify_email(state: &AppState, raw_token: &str) -> Result<Uuid, AppError> {
    let raw_token = raw_token.trim();
    if raw_token.is_empty() {
        return Err(AppError::InvalidToken);
    }

    match state
        .db
        .consume_verification_token(&hash_token(raw_token))
        .await?
    {
        Some(user_id) => {
            info!(%user_id, "email verified");
            Ok(user_id)
        }
        None => Err(AppError::InvalidToken),
    }
}

pub async fn resend_verification(state: &AppState, email: &str) -> Result<(), AppError> {
    let email = normalize_email(email);
    if email.is_empty() {
        return Err(AppError::validation("email", "Email is required"));
    }

    let user = state
        .db
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    if user.email_verified {
        return Err(AppError::validation("email", "Email already verified"));
    }

    // the cooldown is checked inside the update so concurrent resends
    // cannot both pass it
    let now = OffsetDateTime::now_utc();
    let token = generate_token();
    let replaced = state
        .db
        .replace_verification_token(
            user.id,
            &token.hash,
            now,
            now - state.config.verification_resend_cooldown,
        )
        .await?;
    if !replaced {
        return Err(AppError::TooManyRequests(
            "Please wait before requesting another verification email".into(),
        ));
    }

    deliver_verification(
        state,
        &user,
        &token.raw,
        "Failed to resend verification email",
    )
    .await?;

    info!(user_id = %user.id, "verification email resent");
    Ok(())
}

/// Succeeds for unknown emails too, so callers cannot probe for accounts.
pub async fn request_password_reset(state: &AppState, email: &str) -> Result<(), AppError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::validation("email", "Invalid email address"));
    }

    let Some(user) = state.db.find_user_by_email(&email).await? else {
        info!("password reset requested for unknown email");
        return Ok(());
    };

    let token = generate_token();
    let expires_at = OffsetDateTime::now_utc() + state.config.password_reset_ttl;
    state
        .db
        .set_password_reset_token(user.id, &token.hash, expires_at)
        .await?;

    if let Err(err) = state
        .mailer
        .send_reset_email(&user.email, user.display_name(), &token.raw)
        .await
    {
        // not surfaced: the response must match the unknown-email case
        warn!(user_id = %user.id, error = %err, "failed to send password reset email");
    }

    Ok(())
}

/// Checks a reset token without consuming it.
pub async fn probe_reset_token(state: &AppState, raw_token: &str) -> Result<(), AppError> {
    let raw_token = raw_token.trim();
    if raw_token.is_empty() {
        return Err(AppError::InvalidToken);
    }

    state
        .db
        .find_user_id_by_reset_token(&hash_token(raw_token), OffsetDateTime::now_utc())
        .await?
        .map(|_| ())
        .ok_or(AppError::InvalidToken)
}

pub async fn complete_password_reset(
    state: &AppState,
    raw_token: &str,
    new_password: &str,
) -> Result<Uuid, AppError> {
    let raw_token = raw_token.trim();
    if raw_token.is_empty() {
        return Err(AppError::InvalidToken);
    }
    if let Some(message) = password_policy_violation(new_password) {
        return Err(AppError::validation("password", message));
    }

    let password_hash = hash_password(new_password)
        .map_err(|e| AppError::internal("password hashing failed", e))?;

    match state
        .db
        .consume_password_reset_token(
            &hash_token(raw_token),
            &password_hash,
            OffsetDateTime::now_utc(),
        )
        .await?
    {
        Some(user_id) => {
            info!(%user_id, "password reset completed");
            Ok(user_id)
        }
        None => Err(AppError::InvalidToken),
    }
}
