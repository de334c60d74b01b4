use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::routes::json_body::ApiJson;
use crate::{
    errors::AppError, responses::JsonResponse, services::account_tokens::verify_email,
    state::AppState,
};

#[derive(Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub token: String,
}

const VERIFIED: &str = "Email verified successfully. You can now sign in.";

/// Link target from the verification email.
pub async fn verify_email_link(
    State(state): State<AppState>,
    Query(query): Query<VerifyRequest>,
) -> Result<Response, AppError> {
    verify_email(&state, &query.token).await?;
    Ok(JsonResponse::success(VERIFIED).into_response())
}

pub async fn verify_email_post(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<VerifyRequest>,
) -> Result<Response, AppError> {
    verify_email(&state, &payload.token).await?;
    Ok(JsonResponse::success(VERIFIED).into_response())
}
