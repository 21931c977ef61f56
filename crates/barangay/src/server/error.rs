//! Mapping from [`Error`] to HTTP responses.
//!
//! Every failure, including axum's own extractor rejections, answers with
//! `{"error": "<message>"}`.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::error::Error;

/// An [`Error`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub Error);

/// Result type for handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(rejected(rejection.status(), rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self(rejected(rejection.status(), rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(rejected(rejection.status(), rejection.body_text()))
    }
}

/// Well-formed input with the wrong shape is a validation failure; anything
/// unreadable is a bad request.
fn rejected(status: StatusCode, message: String) -> Error {
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        Error::Validation(message)
    } else if status.is_server_error() {
        Error::Internal(message)
    } else {
        Error::BadRequest(message)
    }
}

impl ApiError {
    /// Status code for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Duplicate { .. } | Error::InvalidTransition { .. } => StatusCode::CONFLICT,
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials
            | Error::Unauthorized(_)
            | Error::OtpInvalid
            | Error::OtpExpired => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("Request failed: {}", self.0);
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::header::CONTENT_TYPE;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        count: i64,
    }

    async fn json_rejection(content_type: &str, body: &'static str) -> JsonRejection {
        let request = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body))
            .unwrap();
        axum::Json::<Payload>::from_request(request, &())
            .await
            .unwrap_err()
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::not_found("resident", "RES-2026-0001"), StatusCode::NOT_FOUND),
            (Error::duplicate("resident", "x"), StatusCode::CONFLICT),
            (
                Error::invalid_transition("document", "pending", "released"),
                StatusCode::CONFLICT,
            ),
            (Error::validation("bad"), StatusCode::UNPROCESSABLE_ENTITY),
            (Error::bad_request("unreadable"), StatusCode::BAD_REQUEST),
            (Error::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (Error::unauthorized("token expired"), StatusCode::UNAUTHORIZED),
            (Error::OtpExpired, StatusCode::UNAUTHORIZED),
            (Error::forbidden("admin only"), StatusCode::FORBIDDEN),
            (Error::internal("bug"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }

    #[test]
    fn test_internal_errors_are_not_leaked() {
        let response = ApiError(Error::internal("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_wrongly_typed_json_is_a_validation_error() {
        let rejection = json_rejection("application/json", r#"{"count": "many"}"#).await;
        let err = ApiError::from(rejection);
        assert!(matches!(err.0, Error::Validation(_)));
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_unreadable_json_is_a_bad_request() {
        let err = ApiError::from(json_rejection("application/json", "{count").await);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = ApiError::from(json_rejection("text/plain", r#"{"count": 1}"#).await);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejections_answer_with_json_body() {
        let response = ApiError::from(json_rejection("application/json", "{count").await)
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().starts_with("bad request"));
    }
}
