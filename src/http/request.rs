//! Request types and request-id plumbing.
//!
//! Every request gets an `x-request-id` (UUID v4) unless the caller already
//! sent one; the same id is echoed on the response.

use axum::body::Bytes;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::error::RelayError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Body of `POST /api/completions`.
///
/// `message` is not required: a missing prompt is forwarded upstream as-is.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CompletionRequest {
    #[serde(default)]
    pub message: Option<String>,
}

impl CompletionRequest {
    /// Read the prompt leniently.
    ///
    /// Bodies not declared as JSON, and empty bodies, carry no prompt. A
    /// `message` that is not a string is treated as absent. Only a body that
    /// claims to be JSON and fails to parse is rejected.
    pub fn from_body(headers: &HeaderMap, body: &Bytes) -> Result<Self, RelayError> {
        if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RelayError::BadRequest(format!("Invalid JSON body: {e}")))?;

        let message = match value.get("message") {
            Some(Value::String(message)) => Some(message.clone()),
            _ => None,
        };
        Ok(Self { message })
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn json_headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    fn parse(headers: &HeaderMap, body: &'static str) -> Result<CompletionRequest, RelayError> {
        CompletionRequest::from_body(headers, &Bytes::from_static(body.as_bytes()))
    }

    #[test]
    fn message_is_optional() {
        let headers = json_headers("application/json");
        assert_eq!(parse(&headers, "{}").unwrap().message, None);

        let req = parse(&headers, r#"{"message":"hi","extra":1}"#).unwrap();
        assert_eq!(req.message.as_deref(), Some("hi"));
    }

    #[test]
    fn charset_parameter_is_accepted() {
        let headers = json_headers("application/json; charset=utf-8");
        let req = parse(&headers, r#"{"message":"hi"}"#).unwrap();
        assert_eq!(req.message.as_deref(), Some("hi"));
    }

    #[test]
    fn non_json_content_type_carries_no_prompt() {
        let req = parse(&HeaderMap::new(), r#"{"message":"hi"}"#).unwrap();
        assert_eq!(req.message, None);

        let req = parse(&json_headers("text/plain"), "hello").unwrap();
        assert_eq!(req.message, None);
    }

    #[test]
    fn non_string_message_is_absent() {
        let headers = json_headers("application/json");
        for body in [r#"{"message":5}"#, r#"{"message":null}"#, r#"{"message":["a"]}"#, "[]", "  "] {
            assert_eq!(parse(&headers, body).unwrap().message, None, "{body}");
        }
    }

    #[test]
    fn malformed_json_is_bad_request() {
        let err = parse(&json_headers("application/json"), "{not json").unwrap_err();
        assert!(matches!(err, RelayError::BadRequest(_)));
    }
}
