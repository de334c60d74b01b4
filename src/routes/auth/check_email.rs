use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{errors::AppError, state::AppState, utils::validation::normalize_email};

#[derive(Deserialize)]
pub struct CheckEmailQuery {
    pub email: Option<String>,
}

/// Lets the wizard flag a taken email before the final submission.
pub async fn handle_check_email(
    State(state): State<AppState>,
    Query(query): Query<CheckEmailQuery>,
) -> Result<Json<Value>, AppError> {
    let email = query
        .email
        .as_deref()
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::validation("email", "Email is required"))?;

    let exists = state.db.is_email_taken(&email).await?;
    Ok(Json(json!({ "exists": exists })))
}
