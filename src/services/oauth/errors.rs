use std::fmt;

use crate::models::user::OauthProvider;

#[derive(Debug)]
pub enum OAuthError {
    ProviderNotConfigured(OauthProvider),
    MissingStateCookie,
    MissingCode,
    Denied(String),
    InvalidState,
    TokenExchangeFailed,
    InvalidTokenJson,
    UserInfoFetchFailed,
    InvalidUserInfo,
    NoEmailFound,
    JwtCreationFailed,
    DbError(sqlx::Error),
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use OAuthError::*;
        match self {
            ProviderNotConfigured(provider) => write!(f, "{} sign-in is not available", provider),
            MissingStateCookie => write!(f, "Missing 'oauth_state' cookie"),
            MissingCode => write!(f, "Missing authorization code"),
            Denied(reason) => write!(f, "Sign-in was cancelled: {}", reason),
            InvalidState => write!(f, "Invalid state parameter"),
            TokenExchangeFailed => write!(f, "Provider token request failed"),
            InvalidTokenJson => write!(f, "Invalid token JSON"),
            UserInfoFetchFailed => write!(f, "Failed to fetch provider user info"),
            InvalidUserInfo => write!(f, "Invalid user info"),
            NoEmailFound => write!(f, "No email found in user info"),
            JwtCreationFailed => write!(f, "Failed to create JWT"),
            DbError(err) => write!(f, "Database error: {}", err),
        }
    }
}

impl std::error::Error for OAuthError {}

impl From<sqlx::Error> for OAuthError {
    fn from(e: sqlx::Error) -> Self {
        OAuthError::DbError(e)
    }
}
