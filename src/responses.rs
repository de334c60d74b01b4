use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::utils::validation::FieldErrors;

#[derive(Debug, Serialize, Deserialize)]
pub struct JsonResponse {
    pub status: String,
    pub success: bool,
    pub message: String,
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl JsonResponse {
    fn error(msg: &str) -> Self {
        JsonResponse {
            status: "error".to_string(),
            success: false,
            message: msg.to_string(),
            code: None,
            errors: None,
            redirect: None,
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }

    pub fn success(msg: &str) -> impl IntoResponse {
        (
            StatusCode::OK,
            Json(JsonResponse {
                status: "success".to_string(),
                success: true,
                message: msg.to_string(),
                code: None,
                errors: None,
                redirect: None,
            }),
        )
    }

    pub fn created(msg: &str) -> impl IntoResponse {
        (
            StatusCode::CREATED,
            Json(JsonResponse {
                status: "success".to_string(),
                success: true,
                message: msg.to_string(),
                code: None,
                errors: None,
                redirect: None,
            }),
        )
    }

    pub fn validation(msg: &str, errors: FieldErrors) -> Response {
        JsonResponse {
            errors: Some(errors),
            ..JsonResponse::error(msg)
        }
        .into_response_with(StatusCode::BAD_REQUEST)
    }

    pub fn not_found(msg: &str) -> Response {
        JsonResponse::error(msg).into_response_with(StatusCode::NOT_FOUND)
    }

    pub fn conflict(msg: &str) -> Response {
        JsonResponse::error(msg).into_response_with(StatusCode::CONFLICT)
    }

    pub fn conflict_with_code(msg: &str, code: &str) -> Response {
        JsonResponse::error(msg)
            .with_code(code)
            .into_response_with(StatusCode::CONFLICT)
    }

    pub fn server_error(msg: &str) -> Response {
        JsonResponse::error(msg).into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn bad_gateway_with_code(msg: &str, code: &str) -> Response {
        JsonResponse::error(msg)
            .with_code(code)
            .into_response_with(StatusCode::BAD_GATEWAY)
    }

    pub fn unauthorized(msg: &str) -> Response {
        JsonResponse::error(msg).into_response_with(StatusCode::UNAUTHORIZED)
    }

    pub fn bad_request(msg: &str) -> Response {
        JsonResponse::error(msg).into_response_with(StatusCode::BAD_REQUEST)
    }

    pub fn bad_request_with_code(msg: &str, code: &str) -> Response {
        JsonResponse::error(msg)
            .with_code(code)
            .into_response_with(StatusCode::BAD_REQUEST)
    }

    pub fn too_many_requests(msg: &str) -> Response {
        JsonResponse::error(msg).into_response_with(StatusCode::TOO_MANY_REQUESTS)
    }

    pub fn forbidden_with_code(msg: &str, code: &str) -> Response {
        JsonResponse::error(msg)
            .with_code(code)
            .into_response_with(StatusCode::FORBIDDEN)
    }

    /// 403 carrying the path the client should navigate to instead.
    pub fn forbidden_with_redirect(msg: &str, code: &str, redirect: &str) -> Response {
        JsonResponse {
            redirect: Some(redirect.to_string()),
            ..JsonResponse::error(msg).with_code(code)
        }
        .into_response_with(StatusCode::FORBIDDEN)
    }

    pub fn redirect_to_login_with_error(frontend_origin: &str, msg: &str) -> Response {
        let redirect_url = format!(
            "{}/login?error={}",
            frontend_origin.trim_end_matches('/'),
            urlencoding::encode(msg)
        );
        Redirect::to(&redirect_url).into_response()
    }
}
