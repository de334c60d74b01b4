use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::routes::json_body::ApiJson;
use crate::{
    errors::AppError,
    responses::JsonResponse,
    services::account_tokens::{complete_password_reset, probe_reset_token},
    state::AppState,
};

#[derive(Deserialize)]
pub struct ResetPasswordPayload {
    pub token: String,
    pub password: String,
}

/// Lets the reset page check a link before showing the form.
pub async fn handle_verify_reset_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    probe_reset_token(&state, &token).await?;
    Ok(JsonResponse::success("Token is valid").into_response())
}

pub async fn handle_reset_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ResetPasswordPayload>,
) -> Result<Response, AppError> {
    complete_password_reset(&state, &payload.token, &payload.password).await?;
    Ok(JsonResponse::success("Password has been reset. You can now sign in.").into_response())
}
