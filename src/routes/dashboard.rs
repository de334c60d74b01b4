use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    authz::{landing_path, ProtectedArea},
    errors::AppError,
    routes::auth::session::AuthSession,
    state::AppState,
};

/// Tells the frontend where this session belongs.
pub async fn dashboard(session: AuthSession) -> Result<Response, AppError> {
    session.require(ProtectedArea::Dashboard)?;
    let claims = &session.0;

    Ok(Json(json!({
        "success": true,
        "role": claims.role,
        "redirect": landing_path(claims.role),
    }))
    .into_response())
}

pub async fn customer_dashboard(session: AuthSession) -> Result<Response, AppError> {
    session.require(ProtectedArea::Dashboard)?;
    let claims = &session.0;

    Ok(Json(json!({
        "success": true,
        "email": claims.email,
        "name": claims.name,
        "emailVerified": claims.email_verified,
    }))
    .into_response())
}

pub async fn business_dashboard(
    State(state): State<AppState>,
    session: AuthSession,
) -> Result<Response, AppError> {
    session.require(ProtectedArea::Business)?;
    let owner_id = session
        .0
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("Session expired or invalid".into()))?;

    let business = state
        .db
        .find_business_by_owner(owner_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Business profile not found".into()))?;

    Ok(Json(json!({ "success": true, "business": business })).into_response())
}
