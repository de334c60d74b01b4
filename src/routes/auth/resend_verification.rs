use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::routes::json_body::ApiJson;
use crate::{
    errors::AppError, models::signup::EmailPayload, responses::JsonResponse,
    services::account_tokens::resend_verification, state::AppState,
};

pub async fn handle_resend_verification(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<EmailPayload>,
) -> Result<Response, AppError> {
    resend_verification(&state, &payload.email).await?;
    Ok(JsonResponse::success("Verification email sent").into_response())
}
