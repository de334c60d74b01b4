use axum::{
    extract::State,
    response::{IntoResponse, Response},
};

use crate::routes::json_body::ApiJson;
use crate::{
    errors::AppError, models::signup::EmailPayload, responses::JsonResponse,
    services::account_tokens::request_password_reset, state::AppState,
};

pub const RESET_REQUESTED: &str = "If that email exists, a reset link has been sent.";

pub async fn handle_forgot_password(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<EmailPayload>,
) -> Result<Response, AppError> {
    request_password_reset(&state, &payload.email).await?;
    Ok(JsonResponse::success(RESET_REQUESTED).into_response())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::db::mock_db::{sample_user, MockDb};
    use crate::models::user::UserRole;
    use crate::routes::app;
    use crate::services::smtp_mailer::MockMailer;
    use crate::state::test_support::test_state;

    fn forgot(email: &str) -> Request<Body> {
        Request::post("/api/auth/forgot-password")
            .header("Content-Type", "application/json")
            .body(Body::from(json!({ "email": email }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn known_and_unknown_emails_get_identical_responses() {
        let mailer = Arc::new(MockMailer::default());
        let state = test_state(
            Arc::new(MockDb::with_users([sample_user("known@example.com", UserRole::Customer)])),
            mailer.clone(),
        );

        let known = app(state.clone())
            .oneshot(forgot("known@example.com"))
            .await
            .unwrap();
        let unknown = app(state)
            .oneshot(forgot("unknown@example.com"))
            .await
            .unwrap();

        assert_eq!(known.status(), StatusCode::OK);
        assert_eq!(unknown.status(), StatusCode::OK);
        let known_body = to_bytes(known.into_body(), usize::MAX).await.unwrap();
        let unknown_body = to_bytes(unknown.into_body(), usize::MAX).await.unwrap();
        assert_eq!(known_body, unknown_body);

        assert_eq!(mailer.sent_reset_emails.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_email_is_rejected() {
        let app = app(test_state(
            Arc::new(MockDb::default()),
            Arc::new(MockMailer::default()),
        ));

        let res = app.oneshot(forgot("not-an-email")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
