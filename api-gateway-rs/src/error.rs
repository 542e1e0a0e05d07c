//! HTTP rendering of classified errors

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use error_handling_rs::{log_classified_error, ClassifiedError, ErrorKind};

use crate::ErrorResponse;

/// An error on its way out of a handler
///
/// The body is always `{"error": <message>}`; upstream detail never reaches
/// the caller.
#[derive(Debug)]
pub enum ApiError {
    Classified(ClassifiedError),
    /// The request body could not be read at all, e.g. it exceeded the
    /// payload limit. Rendered with the extractor's own status.
    Unreadable { status: StatusCode, message: String },
}

impl From<ClassifiedError> for ApiError {
    fn from(error: ClassifiedError) -> Self {
        ApiError::Classified(error)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if let JsonRejection::BytesRejection(_) = rejection {
            tracing::warn!(
                status = rejection.status().as_u16(),
                reason = %rejection.body_text(),
                "Request body rejected"
            );
            return ApiError::Unreadable {
                status: rejection.status(),
                message: rejection.body_text(),
            };
        }

        // Bodies that arrive but do not decode are client input defects
        let error = ClassifiedError::new(ErrorKind::RequestInvalid, rejection.body_text());
        log_classified_error(&error);
        ApiError::Classified(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Classified(error) => {
                let status = StatusCode::from_u16(error.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                tracing::debug!(
                    status = status.as_u16(),
                    error_kind = error.kind.code(),
                    "Returning error response"
                );
                (status, error.public_message().to_string())
            }
            ApiError::Unreadable { status, message } => (status, message),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
