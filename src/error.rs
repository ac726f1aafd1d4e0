use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::json::JsonResponse;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every failure the toolkit can return.
///
/// Nothing is retried or logged internally; callers decide how to react.
/// [`ToolkitError::status_code`] gives the HTTP status an HTTP-facing caller
/// would normally map the error to.
#[derive(Debug, Error)]
pub enum ToolkitError {
    #[error("uploaded body is too big, must not exceed {limit} bytes")]
    UploadTooLarge { limit: u64 },

    #[error("file type {detected} is not allowed")]
    FileTypeNotAllowed { detected: String },

    #[error("request content type is missing a multipart boundary")]
    InvalidMultipartBoundary,

    #[error("no file found in request")]
    NoFileInRequest,

    #[error("invalid multipart form data: {0}")]
    Multipart(#[source] multer::Error),

    #[error("body must not be larger than {limit} bytes")]
    JsonTooLarge { limit: usize },

    #[error("body contains badly-formed JSON (at line {line}, column {column})")]
    JsonSyntax { line: usize, column: usize },

    #[error("body contains badly-formed JSON")]
    JsonTruncated,

    #[error("body contains an incorrect JSON type (at line {line}, column {column})")]
    JsonIncorrectType { line: usize, column: usize },

    #[error("body must not be empty")]
    EmptyBody,

    #[error("body contains unknown key `{field}`")]
    JsonUnknownField { field: String },

    #[error("body must contain only one JSON value")]
    MultipleJsonValues,

    /// Decode failures outside the taxonomy above, surfaced verbatim.
    #[error(transparent)]
    Json(serde_json::Error),

    #[error("failed to serialize value to JSON: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("empty string is not permitted")]
    EmptySlugInput,

    #[error("after removing characters, slug is zero length")]
    EmptySlugResult,

    #[error("failed to read request body: {0}")]
    BodyRead(#[source] BoxError),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] axum::http::header::InvalidHeaderValue),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Remote(#[from] reqwest::Error),
}

impl ToolkitError {
    /// HTTP status for this error: limit and malformed-input failures are
    /// client errors, environment failures are server errors.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UploadTooLarge { .. } | Self::JsonTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Self::FileTypeNotAllowed { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::InvalidMultipartBoundary
            | Self::NoFileInRequest
            | Self::Multipart(_)
            | Self::JsonSyntax { .. }
            | Self::JsonTruncated
            | Self::JsonIncorrectType { .. }
            | Self::EmptyBody
            | Self::JsonUnknownField { .. }
            | Self::MultipleJsonValues
            | Self::Json(_)
            | Self::EmptySlugInput
            | Self::EmptySlugResult => StatusCode::BAD_REQUEST,
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
            Self::Serialize(_)
            | Self::BodyRead(_)
            | Self::InvalidHeader(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ToolkitError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload = JsonResponse {
            error: true,
            message: self.to_string(),
            data: None,
        };
        (status, Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_violations_map_to_4xx() {
        assert_eq!(
            ToolkitError::UploadTooLarge { limit: 10 }.status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ToolkitError::FileTypeNotAllowed {
                detected: "application/pdf".to_string()
            }
            .status_code(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(ToolkitError::EmptyBody.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn environment_failures_map_to_5xx() {
        let io = ToolkitError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert_eq!(io.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn messages_name_the_limit() {
        let err = ToolkitError::JsonTooLarge { limit: 1024 };
        assert_eq!(err.to_string(), "body must not be larger than 1024 bytes");
    }
}
