use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::response::Response;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;

use crate::error::ToolkitError;
use crate::Toolkit;

/// Standard response envelope: `{"error": bool, "message": string, "data"?: any}`.
///
/// `data` is omitted from the serialized output entirely when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Toolkit {
    /// Reads the request body as exactly one JSON value of type `T`.
    ///
    /// The body is capped at the configured JSON size limit. Unknown object
    /// keys are rejected unless `allow_unknown_json_fields` is set, and any
    /// non-whitespace input after the first value is an error. Each failure
    /// mode gets its own distinct, human-readable error rather than a
    /// generic "decode failed".
    pub async fn read_json<T: DeserializeOwned>(
        &self,
        req: Request<Body>,
    ) -> Result<T, ToolkitError> {
        let limit = self.config.effective_max_json_bytes();
        let body = Limited::new(req.into_body(), limit);
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
                return Err(ToolkitError::JsonTooLarge { limit });
            }
            Err(err) => return Err(ToolkitError::BodyRead(err)),
        };

        // A body holding only JSON whitespace decodes to nothing, which is
        // an empty body as far as the caller is concerned.
        if bytes
            .iter()
            .all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
        {
            return Err(ToolkitError::EmptyBody);
        }

        let mut de = serde_json::Deserializer::from_slice(&bytes);
        let value = if self.config.allow_unknown_json_fields {
            T::deserialize(&mut de).map_err(classify_decode_error)?
        } else {
            let mut unknown: Option<String> = None;
            let value = serde_ignored::deserialize(&mut de, |path| {
                if unknown.is_none() {
                    unknown = Some(path.to_string());
                }
            })
            .map_err(classify_decode_error)?;
            if let Some(field) = unknown {
                return Err(ToolkitError::JsonUnknownField { field });
            }
            value
        };

        // Anything left besides whitespace means a second top-level value.
        if de.end().is_err() {
            return Err(ToolkitError::MultipleJsonValues);
        }

        Ok(value)
    }

    /// Serializes `data` into a JSON response with the given status.
    ///
    /// Extra headers replace same-named headers wholesale but keep all
    /// values of a multi-valued name; the content type is always
    /// `application/json`.
    pub fn write_json<T: Serialize>(
        &self,
        status: StatusCode,
        data: &T,
        headers: Option<HeaderMap>,
    ) -> Result<Response, ToolkitError> {
        let body = serde_json::to_vec(data).map_err(ToolkitError::Serialize)?;

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        if let Some(extra) = headers {
            for name in extra.keys() {
                response.headers_mut().remove(name);
            }
            for (name, value) in extra.iter() {
                response.headers_mut().append(name, value.clone());
            }
        }
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(response)
    }

    /// Wraps an error in the standard envelope and sends it as JSON.
    ///
    /// The status defaults to 400 Bad Request when not supplied.
    pub fn error_json<E: std::fmt::Display>(
        &self,
        err: &E,
        status: Option<StatusCode>,
    ) -> Result<Response, ToolkitError> {
        let payload = JsonResponse {
            error: true,
            message: err.to_string(),
            data: None,
        };
        self.write_json(status.unwrap_or(StatusCode::BAD_REQUEST), &payload, None)
    }
}

fn classify_decode_error(err: serde_json::Error) -> ToolkitError {
    match err.classify() {
        Category::Syntax => ToolkitError::JsonSyntax {
            line: err.line(),
            column: err.column(),
        },
        Category::Eof => ToolkitError::JsonTruncated,
        Category::Data => {
            let message = err.to_string();
            if let Some(rest) = message.strip_prefix("unknown field `") {
                if let Some(field) = rest.split('`').next() {
                    return ToolkitError::JsonUnknownField {
                        field: field.to_string(),
                    };
                }
            }
            if message.starts_with("invalid type") || message.starts_with("invalid value") {
                return ToolkitError::JsonIncorrectType {
                    line: err.line(),
                    column: err.column(),
                };
            }
            ToolkitError::Json(err)
        }
        Category::Io => ToolkitError::Json(err),
    }
}
