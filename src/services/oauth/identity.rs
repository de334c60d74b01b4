//! Provider callback pipeline: raw profile, then normalized identity, then
//! the local account, then session claims. Only `sign_in` touches storage.

use chrono::Utc;
use serde_json::Value;
use time::Duration;
use tracing::info;

use crate::db::user_repository::UserRepository;
use crate::models::{
    identity::NormalizedIdentity,
    user::{OauthProvider, User},
};
use crate::routes::auth::claims::Claims;
use crate::services::oauth::errors::OAuthError;
use crate::utils::validation::{is_valid_email, normalize_email};

fn non_empty(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Google: `{sub, name, email, picture}`. Facebook: `{id, name, email,
/// picture.data.url}`.
pub fn normalize_profile(
    provider: OauthProvider,
    profile: &Value,
) -> Result<NormalizedIdentity, OAuthError> {
    let (account_id, image) = match provider {
        OauthProvider::Google => (profile["sub"].clone(), non_empty(&profile["picture"])),
        OauthProvider::Facebook => (
            profile["id"].clone(),
            non_empty(&profile["picture"]["data"]["url"]),
        ),
        OauthProvider::Email => return Err(OAuthError::ProviderNotConfigured(provider)),
    };

    // Facebook ids sometimes arrive as numbers
    let provider_account_id = match account_id {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return Err(OAuthError::InvalidUserInfo),
    };

    let email = non_empty(&profile["email"])
        .filter(|e| is_valid_email(e))
        .ok_or(OAuthError::NoEmailFound)?;

    Ok(NormalizedIdentity {
        provider,
        provider_account_id,
        email: normalize_email(&email),
        name: non_empty(&profile["name"]),
        image,
    })
}

/// Finds or creates the account for a provider identity. Existing accounts
/// are marked verified, since the provider vouched for the inbox.
pub async fn sign_in(
    db: &dyn UserRepository,
    identity: &NormalizedIdentity,
) -> Result<User, OAuthError> {
    let user = match db.find_user_by_email(&identity.email).await? {
        Some(existing) => {
            db.refresh_user_from_oauth(
                existing.id,
                identity.name.as_deref(),
                identity.image.as_deref(),
            )
            .await?
        }
        None => {
            let created = db.create_user_with_oauth(identity).await?;
            info!(user_id = %created.id, provider = %identity.provider, "account created via social sign-in");
            created
        }
    };

    db.link_oauth_account(user.id, identity.provider, &identity.provider_account_id)
        .await?;

    Ok(user)
}

pub fn claims_for_user(user: &User, ttl: Duration) -> Claims {
    let expires_at = Utc::now() + chrono::Duration::seconds(ttl.whole_seconds());

    Claims {
        sub: user.id.to_string(),
        email: user.email.clone(),
        name: user.name.clone(),
        role: user.role,
        email_verified: user.email_verified,
        exp: expires_at.timestamp() as usize,
        iss: String::new(),
        aud: String::new(),
    }
}
