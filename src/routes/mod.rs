use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub mod auth;
pub mod dashboard;
pub mod json_body;

use auth::*;
use dashboard::{business_dashboard, customer_dashboard, dashboard};

/// Everything under `/api/auth`. Kept separate so the binary can put the
/// stricter rate limiter on it.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handle_register))
        .route("/register/business", post(handle_register_business))
        .route("/verify-email", get(verify_email_link))
        .route("/verify", post(verify_email_post))
        .route("/resend-verification", post(handle_resend_verification))
        .route("/forgot-password", post(handle_forgot_password))
        .route("/verify-reset-token/{token}", get(handle_verify_reset_token))
        .route("/reset-password", post(handle_reset_password))
        .route("/login", post(handle_login))
        .route("/logout", post(handle_logout))
        .route("/me", get(handle_me))
        .route("/{provider}/login", get(social_login))
        .route("/{provider}/callback", get(social_callback))
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/check-email", get(handle_check_email))
        .route("/api/dashboard", get(dashboard))
        .route("/api/customer/dashboard", get(customer_dashboard))
        .route("/api/business/dashboard", get(business_dashboard))
}

/// Assembles the API around an already-layered auth router.
pub fn build(auth: Router<AppState>) -> Router<AppState> {
    Router::new().nest("/api/auth", auth).merge(api_routes())
}

pub fn app(state: AppState) -> Router {
    build(auth_routes()).with_state(state)
}
