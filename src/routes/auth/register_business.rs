use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::routes::json_body::ApiJson;
use crate::{
    errors::AppError, models::signup::BusinessSignupPayload,
    services::registration::register_business, state::AppState,
};

/// Final submission of the registration wizard.
pub async fn handle_register_business(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<BusinessSignupPayload>,
) -> Result<Response, AppError> {
    let (_, business) = register_business(&state, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "businessId": business.id,
            "message": "Business registered successfully. Please check your email to verify your account.",
        })),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::db::mock_db::{sample_user, MockDb};
    use crate::models::{signup::BusinessSignupPayload, user::UserRole};
    use crate::routes::{app, test_support::body_json};
    use crate::services::smtp_mailer::MockMailer;
    use crate::state::test_support::test_state;
    use crate::utils::validation::tests::valid_business_payload;

    fn submit(payload: &BusinessSignupPayload) -> Request<Body> {
        Request::post("/api/auth/register/business")
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(payload).unwrap()))
            .unwrap()
    }

    #[tokio::test]
    async fn creates_owner_and_business() {
        let db = Arc::new(MockDb::default());
        let app = app(test_state(db.clone(), Arc::new(MockMailer::default())));

        let res = app.oneshot(submit(&valid_business_payload())).await.unwrap();

        assert_eq!(res.status(), StatusCode::CREATED);
        let json = body_json(res).await;
        assert_eq!(json["success"], true);
        assert!(json["businessId"].is_string());
        assert_eq!(db.business_count(), 1);
        assert_eq!(
            db.user("aoife@example.com").unwrap().role,
            UserRole::BusinessOwner
        );
    }

    #[tokio::test]
    async fn unverified_duplicate_is_flagged_for_verification() {
        let mut pending = sample_user("aoife@example.com", UserRole::BusinessOwner);
        pending.email_verified = false;
        let db = Arc::new(MockDb::with_users([pending]));
        let app = app(test_state(db, Arc::new(MockMailer::default())));

        let res = app.oneshot(submit(&valid_business_payload())).await.unwrap();

        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(res).await["code"], "needs_verification");
    }

    #[tokio::test]
    async fn invalid_payload_reports_all_failing_fields() {
        let app = app(test_state(
            Arc::new(MockDb::default()),
            Arc::new(MockMailer::default()),
        ));
        let mut payload = valid_business_payload();
        payload.business_category = String::new();
        payload.eircode = Some("nope".into());

        let res = app.oneshot(submit(&payload)).await.unwrap();

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = body_json(res).await;
        assert_eq!(json["errors"]["businessCategory"], "Business category is required");
        assert_eq!(json["errors"]["eircode"], "Invalid Eircode format");
    }
}
