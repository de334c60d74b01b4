use axum::{extract::State, response::IntoResponse};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration as TimeDuration;

use crate::{responses::JsonResponse, routes::auth::session::AUTH_COOKIE, state::AppState};

pub async fn handle_logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let expired_cookie = Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(state.config.auth_cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(TimeDuration::seconds(0))
        .build();

    (
        jar.add(expired_cookie),
        JsonResponse::success("Logged out"),
    )
}
