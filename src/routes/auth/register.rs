use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::routes::json_body::ApiJson;
use crate::{
    errors::AppError,
    models::{signup::SignupPayload, user::PublicUser},
    services::registration::register_customer,
    state::AppState,
};

pub async fn handle_register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SignupPayload>,
) -> Result<Response, AppError> {
    let user = register_customer(&state, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "success": true,
            "message": "Registration successful. Check your email to verify your account.",
            "user": PublicUser::from(&user),
        })),
    )
        .into_response())
}
