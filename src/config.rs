use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration as StdDuration;

use thiserror::Error;
use time::Duration;

use crate::models::user::OauthProvider;
use crate::services::retrying_mailer::RetryPolicy;

pub const DEFAULT_BIND_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000);
pub const DEFAULT_PASSWORD_RESET_TTL_MINUTES: i64 = 60;
pub const DEFAULT_RESEND_COOLDOWN_SECONDS: i64 = 60;
pub const DEFAULT_EMAIL_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_EMAIL_RETRY_BASE_DELAY_MS: u64 = 1000;

const GOOGLE_AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const FACEBOOK_AUTHORIZE_URL: &str = "https://www.facebook.com/v19.0/dialog/oauth";
const FACEBOOK_TOKEN_URL: &str = "https://graph.facebook.com/v19.0/oauth/access_token";
const FACEBOOK_USERINFO_URL: &str = "https://graph.facebook.com/me?fields=id,name,email,picture";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

#[derive(Debug, Clone, Default)]
pub struct OAuthSettings {
    pub google: Option<OAuthProviderConfig>,
    pub facebook: Option<OAuthProviderConfig>,
}

impl OAuthSettings {
    pub fn provider(&self, provider: OauthProvider) -> Option<&OAuthProviderConfig> {
        match provider {
            OauthProvider::Google => self.google.as_ref(),
            OauthProvider::Facebook => self.facebook.as_ref(),
            OauthProvider::Email => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitSettings {
    pub auth_per_second: u64,
    pub auth_burst: u32,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub frontend_origin: String,
    /// Base for links placed in emails.
    pub app_url: String,
    pub bind_addr: SocketAddr,
    pub auth_cookie_secure: bool,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub password_reset_ttl: Duration,
    pub verification_resend_cooldown: Duration,
    pub email_retry: RetryPolicy,
    pub oauth: OAuthSettings,
    pub rate_limit: RateLimitSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok(); // Load .env file

        let database_url = required("DATABASE_URL")?;
        let frontend_origin = required("FRONTEND_ORIGIN")?;
        let app_url = optional("APP_URL").unwrap_or_else(|| frontend_origin.clone());

        let bind_addr = parse_or("BIND_ADDR", DEFAULT_BIND_ADDR)?;
        let auth_cookie_secure = parse_or("AUTH_COOKIE_SECURE", true)?;

        let reset_minutes = parse_or(
            "PASSWORD_RESET_TTL_MINUTES",
            DEFAULT_PASSWORD_RESET_TTL_MINUTES,
        )?;
        let cooldown_seconds = parse_or(
            "VERIFICATION_RESEND_COOLDOWN_SECONDS",
            DEFAULT_RESEND_COOLDOWN_SECONDS,
        )?;

        let retry_attempts = parse_or("EMAIL_RETRY_ATTEMPTS", DEFAULT_EMAIL_RETRY_ATTEMPTS)?;
        if retry_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "EMAIL_RETRY_ATTEMPTS",
                reason: "must be at least 1".into(),
            });
        }
        let retry_delay_ms = parse_or("EMAIL_RETRY_BASE_DELAY_MS", DEFAULT_EMAIL_RETRY_BASE_DELAY_MS)?;

        Ok(Config {
            database_url,
            frontend_origin,
            app_url: app_url.trim_end_matches('/').to_string(),
            bind_addr,
            auth_cookie_secure,
            jwt_issuer: optional("JWT_ISSUER").unwrap_or_else(|| "bizdir".to_string()),
            jwt_audience: optional("JWT_AUDIENCE").unwrap_or_else(|| "bizdir-web".to_string()),
            password_reset_ttl: Duration::minutes(reset_minutes),
            verification_resend_cooldown: Duration::seconds(cooldown_seconds),
            email_retry: RetryPolicy {
                max_attempts: retry_attempts,
                base_delay: StdDuration::from_millis(retry_delay_ms),
            },
            oauth: OAuthSettings {
                google: oauth_provider_from_env(
                    "GOOGLE",
                    GOOGLE_AUTHORIZE_URL,
                    GOOGLE_TOKEN_URL,
                    GOOGLE_USERINFO_URL,
                )?,
                facebook: oauth_provider_from_env(
                    "FACEBOOK",
                    FACEBOOK_AUTHORIZE_URL,
                    FACEBOOK_TOKEN_URL,
                    FACEBOOK_USERINFO_URL,
                )?,
            },
            rate_limit: RateLimitSettings {
                auth_per_second: parse_or("RATE_LIMITER_AUTH_SECONDS", 1)?,
                auth_burst: parse_or("RATE_LIMITER_AUTH_BURST", 10)?,
            },
        })
    }
}

/// A provider is enabled when its client id is set; the secret and redirect
/// URI are then required.
fn oauth_provider_from_env(
    prefix: &'static str,
    authorize_url: &str,
    token_url: &str,
    userinfo_url: &str,
) -> Result<Option<OAuthProviderConfig>, ConfigError> {
    let Some(client_id) = optional(&format!("{prefix}_CLIENT_ID")) else {
        return Ok(None);
    };

    let secret_key: &'static str = match prefix {
        "GOOGLE" => "GOOGLE_CLIENT_SECRET",
        _ => "FACEBOOK_CLIENT_SECRET",
    };
    let redirect_key: &'static str = match prefix {
        "GOOGLE" => "GOOGLE_REDIRECT_URI",
        _ => "FACEBOOK_REDIRECT_URI",
    };

    Ok(Some(OAuthProviderConfig {
        client_id,
        client_secret: required(secret_key)?,
        redirect_uri: required(redirect_key)?,
        authorize_url: optional(&format!("{prefix}_AUTHORIZE_URL"))
            .unwrap_or_else(|| authorize_url.to_string()),
        token_url: optional(&format!("{prefix}_TOKEN_URL"))
            .unwrap_or_else(|| token_url.to_string()),
        userinfo_url: optional(&format!("{prefix}_USERINFO_URL"))
            .unwrap_or_else(|| userinfo_url.to_string()),
    }))
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn optional(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(key) {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        frontend_origin: "http://localhost:3001".into(),
        app_url: "http://localhost:3001".into(),
        bind_addr: DEFAULT_BIND_ADDR,
        auth_cookie_secure: false,
        jwt_issuer: "test-issuer".into(),
        jwt_audience: "test-audience".into(),
        password_reset_ttl: Duration::minutes(DEFAULT_PASSWORD_RESET_TTL_MINUTES),
        verification_resend_cooldown: Duration::seconds(DEFAULT_RESEND_COOLDOWN_SECONDS),
        email_retry: RetryPolicy {
            max_attempts: DEFAULT_EMAIL_RETRY_ATTEMPTS,
            base_delay: StdDuration::ZERO,
        },
        oauth: OAuthSettings::default(),
        rate_limit: RateLimitSettings {
            auth_per_second: 1,
            auth_burst: 10,
        },
    }
}
