use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    authz::landing_path,
    errors::AppError,
    models::user::{OauthProvider, User},
    responses::JsonResponse,
    routes::auth::login::{issue_session, SESSION_TTL},
    services::oauth::{
        errors::OAuthError,
        identity::{normalize_profile, sign_in},
    },
    state::AppState,
    utils::token::generate_token,
};

const OAUTH_STATE_COOKIE: &str = "oauth_state";

#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn state_cookie(value: String, secure: bool, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

fn parse_provider(slug: &str) -> Result<OauthProvider, AppError> {
    OauthProvider::from_slug(slug)
        .ok_or_else(|| AppError::NotFound("Unknown sign-in provider".into()))
}

/// Redirects to the provider's consent page with a fresh CSRF state.
pub async fn social_login(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let provider = parse_provider(&provider)?;
    let client = state.oauth.get(provider).map_err(|e| AppError::NotFound(e.to_string()))?;

    let csrf = generate_token().raw;
    let url = client
        .authorize_url(&csrf)
        .map_err(|e| AppError::internal("failed to build authorize url", e))?;

    let cookie = state_cookie(
        csrf,
        state.config.auth_cookie_secure,
        time::Duration::minutes(10),
    );
    Ok((jar.add(cookie), Redirect::to(&url)).into_response())
}

async fn complete_sign_in(
    state: &AppState,
    provider: OauthProvider,
    jar: &CookieJar,
    params: OAuthCallback,
) -> Result<User, OAuthError> {
    if let Some(reason) = params.error {
        return Err(OAuthError::Denied(reason));
    }

    let expected = jar
        .get(OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(OAuthError::MissingStateCookie)?;
    if params.state.as_deref() != Some(expected.as_str()) {
        return Err(OAuthError::InvalidState);
    }
    let code = params.code.ok_or(OAuthError::MissingCode)?;

    let client = state.oauth.get(provider)?;
    let access_token = client.exchange_code_for_token(&code).await?;
    let profile = client.fetch_profile(&access_token).await?;
    let identity = normalize_profile(provider, &profile)?;

    sign_in(state.db.as_ref(), &identity).await
}

pub async fn social_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Query(params): Query<OAuthCallback>,
) -> Response {
    let secure = state.config.auth_cookie_secure;
    let clear_state = CookieJar::new().add(state_cookie(
        String::new(),
        secure,
        time::Duration::seconds(0),
    ));

    let Some(provider) = OauthProvider::from_slug(&provider) else {
        return JsonResponse::redirect_to_login_with_error(
            &state.config.frontend_origin,
            "Unknown sign-in provider",
        );
    };

    let user = match complete_sign_in(&state, provider, &jar, params).await {
        Ok(user) => user,
        Err(err) => {
            warn!(%provider, error = %err, "social sign-in failed");
            let redirect =
                JsonResponse::redirect_to_login_with_error(&state.config.frontend_origin, &err.to_string());
            return (clear_state, redirect).into_response();
        }
    };

    let auth_cookie = match issue_session(&state, &user, SESSION_TTL) {
        Ok(cookie) => cookie,
        Err(_) => {
            return (
                clear_state,
                JsonResponse::redirect_to_login_with_error(
                    &state.config.frontend_origin,
                    &OAuthError::JwtCreationFailed.to_string(),
                ),
            )
                .into_response();
        }
    };
    info!(user_id = %user.id, %provider, "social sign-in completed");

    let destination = format!(
        "{}{}",
        state.config.frontend_origin.trim_end_matches('/'),
        landing_path(user.role)
    );
    (clear_state.add(auth_cookie), Redirect::to(&destination)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::db::mock_db::{sample_user, MockDb};
    use crate::models::user::{OauthProvider, UserRole};
    use crate::routes::app;
    use crate::services::oauth::{mock_oauth::MockOAuthClient, OAuthProviders};
    use crate::services::smtp_mailer::MockMailer;
    use crate::state::{test_support::test_state, AppState};

    fn state_with_google(db: Arc<MockDb>, client: MockOAuthClient) -> AppState {
        let mut state = test_state(db, Arc::new(MockMailer::default()));
        state.oauth = Arc::new(OAuthProviders::default().with(Arc::new(client)));
        state
    }

    fn google_profile(email: &str) -> serde_json::Value {
        json!({
            "sub": "google-42",
            "email": email,
            "name": "Google User",
            "picture": "https://img.example.com/u.png"
        })
    }

    fn location(res: &Response) -> String {
        res.headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    fn set_cookies(res: &Response) -> Vec<String> {
        res.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    fn callback(query: &str, state_cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::get(format!("/api/auth/google/callback?{query}"));
        if let Some(value) = state_cookie {
            builder = builder.header(header::COOKIE, format!("oauth_state={value}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn login_sets_state_cookie_and_redirects() {
        let state = state_with_google(
            Arc::new(MockDb::default()),
            MockOAuthClient::new(OauthProvider::Google, google_profile("a@b.ie")),
        );

        let res = app(state)
            .oneshot(Request::get("/api/auth/google/login").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(matches!(
            res.status(),
            StatusCode::FOUND | StatusCode::SEE_OTHER
        ));
        assert!(location(&res).starts_with("https://provider.example.com/google/authorize"));
        assert!(set_cookies(&res)
            .iter()
            .any(|c| c.starts_with("oauth_state=")));
    }

    #[tokio::test]
    async fn unconfigured_provider_is_not_found() {
        let state = state_with_google(
            Arc::new(MockDb::default()),
            MockOAuthClient::new(OauthProvider::Google, google_profile("a@b.ie")),
        );

        let res = app(state)
            .oneshot(
                Request::get("/api/auth/facebook/login")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn callback_creates_account_and_signs_in() {
        let db = Arc::new(MockDb::default());
        let state = state_with_google(
            db.clone(),
            MockOAuthClient::new(OauthProvider::Google, google_profile("fresh@example.com")),
        );

        let res = app(state)
            .oneshot(callback("code=abc&state=s1", Some("s1")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&res), "http://localhost:3001/customer/dashboard");
        assert!(set_cookies(&res)
            .iter()
            .any(|c| c.starts_with("auth_token=") && c.contains("HttpOnly")));

        let user = db.user("fresh@example.com").unwrap();
        assert!(user.email_verified);
        assert_eq!(db.oauth_links().len(), 1);
    }

    #[tokio::test]
    async fn callback_lands_existing_owner_on_business_dashboard() {
        let db = Arc::new(MockDb::with_users([sample_user(
            "owner@example.com",
            UserRole::BusinessOwner,
        )]));
        let state = state_with_google(
            db,
            MockOAuthClient::new(OauthProvider::Google, google_profile("owner@example.com")),
        );

        let res = app(state)
            .oneshot(callback("code=abc&state=s1", Some("s1")))
            .await
            .unwrap();
        assert_eq!(location(&res), "http://localhost:3001/business/dashboard");
    }

    #[tokio::test]
    async fn callback_with_mismatched_state_redirects_to_login() {
        let db = Arc::new(MockDb::default());
        let state = state_with_google(
            db.clone(),
            MockOAuthClient::new(OauthProvider::Google, google_profile("x@example.com")),
        );

        let res = app(state)
            .oneshot(callback("code=abc&state=forged", Some("s1")))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::SEE_OTHER);
        assert!(location(&res).starts_with("http://localhost:3001/login?error="));
        assert_eq!(db.user_count(), 0);
    }

    #[tokio::test]
    async fn callback_without_state_cookie_redirects_to_login() {
        let state = state_with_google(
            Arc::new(MockDb::default()),
            MockOAuthClient::new(OauthProvider::Google, google_profile("x@example.com")),
        );

        let res = app(state)
            .oneshot(callback("code=abc&state=s1", None))
            .await
            .unwrap();
        assert!(location(&res).contains("oauth_state"));
    }

    #[tokio::test]
    async fn profile_without_email_redirects_with_error() {
        let state = state_with_google(
            Arc::new(MockDb::default()),
            MockOAuthClient::new(OauthProvider::Google, json!({ "sub": "1" })),
        );

        let res = app(state)
            .oneshot(callback("code=abc&state=s1", Some("s1")))
            .await
            .unwrap();
        assert!(location(&res).contains("No%20email%20found"));
    }

    #[tokio::test]
    async fn failed_token_exchange_redirects_with_error() {
        let mut client = MockOAuthClient::new(OauthProvider::Google, google_profile("x@example.com"));
        client.fail_exchange = true;
        let state = state_with_google(Arc::new(MockDb::default()), client);

        let res = app(state)
            .oneshot(callback("code=abc&state=s1", Some("s1")))
            .await
            .unwrap();
        assert!(location(&res).starts_with("http://localhost:3001/login?error="));
    }
}
