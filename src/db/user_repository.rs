use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::is_unique_violation;

use crate::models::{
    business::{Business, NewBusiness},
    identity::NormalizedIdentity,
    user::{EmailVerificationStatus, NewAccount, OauthProvider, User},
};

/// Account inserts report a taken email separately, so a registration that
/// loses a race with another one is still a conflict.
#[derive(Debug, Error)]
pub enum InsertError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for InsertError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            InsertError::DuplicateEmail
        } else {
            InsertError::Database(err)
        }
    }
}

/// Every email argument is expected to be normalized already.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;
    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn is_email_taken(&self, email: &str) -> Result<bool, sqlx::Error>;

    async fn create_user(&self, account: &NewAccount) -> Result<User, InsertError>;
    /// Inserts the owner account and its business in one transaction.
    async fn create_business_owner(
        &self,
        account: &NewAccount,
        business: &NewBusiness,
    ) -> Result<(User, Business), InsertError>;
    async fn find_business_by_owner(&self, owner_id: Uuid)
        -> Result<Option<Business>, sqlx::Error>;

    /// Marks the matching account verified and clears the token. Returns the
    /// account id, or `None` when no account holds this hash.
    async fn consume_verification_token(
        &self,
        token_hash: &str,
    ) -> Result<Option<Uuid>, sqlx::Error>;
    /// Stores a fresh verification token hash and counts the attempt, unless
    /// the previous attempt is later than `not_after`. Returns whether the
    /// token was replaced.
    async fn replace_verification_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        attempted_at: OffsetDateTime,
        not_after: OffsetDateTime,
    ) -> Result<bool, sqlx::Error>;
    async fn set_verification_status(
        &self,
        user_id: Uuid,
        status: EmailVerificationStatus,
    ) -> Result<(), sqlx::Error>;

    async fn set_password_reset_token(
        &self,
        user_id: Uuid,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> Result<(), sqlx::Error>;
    /// Looks up an unexpired reset token without consuming it.
    async fn find_user_id_by_reset_token(
        &self,
        token_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<Uuid>, sqlx::Error>;
    /// Swaps the password hash and clears token and expiry, provided the
    /// token is still unexpired.
    async fn consume_password_reset_token(
        &self,
        token_hash: &str,
        password_hash: &str,
        now: OffsetDateTime,
    ) -> Result<Option<Uuid>, sqlx::Error>;

    async fn create_user_with_oauth(
        &self,
        identity: &NormalizedIdentity,
    ) -> Result<User, sqlx::Error>;
    /// Marks the account verified and refreshes profile fields the provider
    /// supplied. `None` keeps the stored value.
    async fn refresh_user_from_oauth(
        &self,
        user_id: Uuid,
        name: Option<&str>,
        image: Option<&str>,
    ) -> Result<User, sqlx::Error>;
    /// Idempotent.
    async fn link_oauth_account(
        &self,
        user_id: Uuid,
        provider: OauthProvider,
        provider_account_id: &str,
    ) -> Result<(), sqlx::Error>;
}
