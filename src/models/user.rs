use core::fmt;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::Type, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    BusinessOwner,
    Admin,
    Moderator,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Customer => "customer",
            UserRole::BusinessOwner => "business_owner",
            UserRole::Admin => "admin",
            UserRole::Moderator => "moderator",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an account was first created. `Email` covers the password flows.
#[derive(sqlx::Type, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, Copy, Clone)]
#[sqlx(type_name = "oauth_provider", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OauthProvider {
    Email,
    Google,
    Facebook,
}

impl OauthProvider {
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug.trim().to_ascii_lowercase().as_str() {
            "google" => Some(OauthProvider::Google),
            "facebook" => Some(OauthProvider::Facebook),
            _ => None,
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            OauthProvider::Email => "email",
            OauthProvider::Google => "google",
            OauthProvider::Facebook => "facebook",
        }
    }
}

impl fmt::Display for OauthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OauthProvider::Email => "Email",
            OauthProvider::Google => "Google",
            OauthProvider::Facebook => "Facebook",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "email_verification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmailVerificationStatus {
    Pending,
    Sent,
    Failed,
    Verified,
}

#[derive(Debug, FromRow, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub oauth_provider: Option<OauthProvider>,
    pub email_verified: bool,
    pub email_verification_attempts: i32,
    #[serde(with = "time::serde::rfc3339::option")]
    pub email_verification_last_attempt: Option<OffsetDateTime>,
    pub email_verification_status: EmailVerificationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("there")
    }

    /// Accounts created through a social provider carry no password.
    pub fn has_password(&self) -> bool {
        !self.password_hash.trim().is_empty()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: UserRole,
    pub email_verified: bool,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            image: user.image.clone(),
            role: user.role,
            email_verified: user.email_verified,
        }
    }
}

/// Insert-side view of an account created through one of the password flows.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub role: UserRole,
    pub verification_token_hash: String,
}
