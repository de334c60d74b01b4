use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::errors::AppError;

/// `axum::Json` whose rejections come back in the API's error body instead
/// of axum's plain-text 4xx.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let (field, message) = describe_data_error(&err.body_text());
                AppError::validation(&field, message)
            }
            JsonRejection::MissingJsonContentType(_) => {
                AppError::validation("body", "Expected a JSON request body")
            }
            _ => AppError::validation("body", "Request body is not valid JSON"),
        }
    }
}

/// Splits axum's deserialization text, e.g. `...target type: openingHours.?:
/// unknown variant ...`, into the failing field and serde's message.
fn describe_data_error(text: &str) -> (String, String) {
    let detail = text.split_once(": ").map_or(text, |(_, rest)| rest);
    let detail = detail
        .rfind(" at line ")
        .map_or(detail, |idx| &detail[..idx]);

    if let Some(field) = detail
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(field, _)| field)
    {
        return (field.to_string(), "This field is required".to_string());
    }

    match detail.split_once(": ") {
        Some((path, message)) if !path.contains(' ') => {
            let field = path
                .split('.')
                .filter(|segment| !segment.is_empty() && *segment != "?")
                .collect::<Vec<_>>()
                .join(".");
            let field = if field.is_empty() { "body".to_string() } else { field };
            (field, message.to_string())
        }
        _ => ("body".to_string(), detail.to_string()),
    }
}
