use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use time::Duration;
use tracing::{info, warn};

use crate::routes::json_body::ApiJson;
use crate::{
    authz::landing_path,
    errors::AppError,
    models::user::{OauthProvider, PublicUser, User},
    routes::auth::session::{AuthSession, AUTH_COOKIE},
    services::oauth::identity::claims_for_user,
    state::AppState,
    utils::{
        jwt::create_jwt,
        password::verify_password,
        validation::{normalize_email, FieldErrors},
    },
};

pub const SESSION_TTL: Duration = Duration::days(7);
pub const REMEMBER_ME_TTL: Duration = Duration::days(30);

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

pub(crate) fn session_cookie(token: String, ttl: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(ttl)
        .build()
}

/// Signs a session token for `user` and wraps it in the auth cookie.
pub(crate) fn issue_session(
    state: &AppState,
    user: &User,
    ttl: Duration,
) -> Result<Cookie<'static>, AppError> {
    let claims = claims_for_user(user, ttl);
    let token = create_jwt(
        claims,
        &state.jwt_keys,
        &state.config.jwt_issuer,
        &state.config.jwt_audience,
    )
    .map_err(|e| AppError::internal("failed to sign session token", e))?;

    Ok(session_cookie(token, ttl, state.config.auth_cookie_secure))
}

pub async fn handle_login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(payload): ApiJson<LoginPayload>,
) -> Result<Response, AppError> {
    let email = normalize_email(&payload.email);

    let mut missing = FieldErrors::new();
    if email.is_empty() {
        missing.insert("email", "Email is required");
    }
    if payload.password.is_empty() {
        missing.insert("password", "Password is required");
    }
    missing.into_result().map_err(AppError::Validation)?;

    let Some(user) = state.db.find_user_by_email(&email).await? else {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if !user.has_password() {
        return Err(match user.oauth_provider {
            Some(provider @ (OauthProvider::Google | OauthProvider::Facebook)) => {
                AppError::Unauthorized(format!(
                    "This account uses {} sign-in. Continue with /api/auth/{}/login.",
                    provider,
                    provider.slug()
                ))
            }
            _ => AppError::Unauthorized(INVALID_CREDENTIALS.into()),
        });
    }

    let matches = verify_password(&payload.password, &user.password_hash)
        .map_err(|e| AppError::internal("password verification failed", e))?;
    if !matches {
        warn!(user_id = %user.id, "failed login attempt");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    if !user.email_verified {
        return Err(AppError::Forbidden {
            message: "Please verify your email before signing in".into(),
            code: "email_not_verified",
        });
    }

    let ttl = if payload.remember {
        REMEMBER_ME_TTL
    } else {
        SESSION_TTL
    };
    let cookie = issue_session(&state, &user, ttl)?;
    info!(user_id = %user.id, "user signed in");

    Ok((
        jar.add(cookie),
        Json(json!({
            "success": true,
            "user": PublicUser::from(&user),
            "redirect": landing_path(user.role),
        })),
    )
        .into_response())
}

pub async fn handle_me(
    State(state): State<AppState>,
    AuthSession(claims): AuthSession,
) -> Result<Response, AppError> {
    let user_id = claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("Session expired or invalid".into()))?;

    let user = state
        .db
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Account no longer exists".into()))?;

    Ok(Json(json!({ "success": true, "user": PublicUser::from(&user) })).into_response())
}
