use tracing::info;

use crate::db::user_repository::UserRepository;
use crate::errors::{AppError, EMAIL_TAKEN_MESSAGE};
use crate::models::{
    business::Business,
    signup::{BusinessSignupPayload, SignupPayload},
    user::{NewAccount, User, UserRole},
};
use crate::services::account_tokens::deliver_verification;
use crate::state::AppState;
use crate::utils::password::hash_password;
use crate::utils::token::generate_token;
use crate::utils::validation::{normalize_email, validate_business_signup, validate_signup};

const VERIFICATION_NOT_SENT: &str = "Account created, but the verification email could not be sent. \
     Request a new one from /api/auth/resend-verification.";

/// Verified owner: plain conflict. Unverified owner: the caller should be
/// pointed at verification instead.
pub async fn ensure_email_available(db: &dyn UserRepository, email: &str) -> Result<(), AppError> {
    match db.find_user_by_email(email).await? {
        Some(user) if user.email_verified => Err(AppError::Conflict(EMAIL_TAKEN_MESSAGE.into())),
        Some(_) => Err(AppError::NeedsVerification),
        None => Ok(()),
    }
}

fn clean_name(name: Option<&str>) -> Option<String> {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}

pub async fn register_customer(state: &AppState, payload: &SignupPayload) -> Result<User, AppError> {
    validate_signup(payload)
        .into_result()
        .map_err(AppError::Validation)?;

    let email = normalize_email(&payload.email);
    ensure_email_available(state.db.as_ref(), &email).await?;

    let password_hash = hash_password(&payload.password)
        .map_err(|e| AppError::internal("password hashing failed", e))?;
    let token = generate_token();

    let account = NewAccount {
        email,
        name: clean_name(payload.name.as_deref()),
        password_hash,
        role: UserRole::Customer,
        verification_token_hash: token.hash.clone(),
    };
    // a concurrent signup can still win between the check and the insert
    let user = state.db.create_user(&account).await?;
    info!(user_id = %user.id, "customer account created");

    // the account stays even if this fails; resend is the recovery path
    deliver_verification(state, &user, &token.raw, VERIFICATION_NOT_SENT).await?;

    Ok(user)
}

pub async fn register_business(
    state: &AppState,
    payload: &BusinessSignupPayload,
) -> Result<(User, Business), AppError> {
    validate_business_signup(payload)
        .into_result()
        .map_err(AppError::Validation)?;

    let email = normalize_email(&payload.email);
    ensure_email_available(state.db.as_ref(), &email).await?;

    let password_hash = hash_password(&payload.password)
        .map_err(|e| AppError::internal("password hashing failed", e))?;
    let token = generate_token();

    let account = NewAccount {
        email,
        name: clean_name(Some(&payload.full_name)),
        password_hash,
        role: UserRole::BusinessOwner,
        verification_token_hash: token.hash.clone(),
    };
    let (user, business) = state
        .db
        .create_business_owner(&account, &payload.to_new_business())
        .await?;
    info!(user_id = %user.id, business_id = %business.id, "business account created");

    deliver_verification(state, &user, &token.raw, VERIFICATION_NOT_SENT).await?;

    Ok((user, business))
}
