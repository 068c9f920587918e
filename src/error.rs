//! Errors surfaced to HTTP callers.
//!
//! | variant      | status              | body                         |
//! |--------------|---------------------|------------------------------|
//! | BadRequest   | 400                 | parse error text             |
//! | Unauthorized | 401                 | `Unauthorized`               |
//! | RateLimited  | 429                 | configured message           |
//! | Upstream     | upstream's status   | upstream's body, verbatim    |
//! | Transport    | 500                 | error message text           |
//!
//! Notification failures never become a `RelayError`.

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

use crate::upstream::UpstreamError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after: Duration,
    },

    #[error("upstream returned {status}")]
    Upstream {
        status: StatusCode,
        content_type: Option<String>,
        body: Bytes,
    },

    #[error("{0}")]
    Transport(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::Unauthorized => StatusCode::UNAUTHORIZED,
            RelayError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            RelayError::Upstream { status, .. } => *status,
            RelayError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<UpstreamError> for RelayError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::Status {
                status,
                content_type,
                body,
            } => RelayError::Upstream {
                status,
                content_type,
                body,
            },
            UpstreamError::Transport(message) => RelayError::Transport(message),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            RelayError::Upstream {
                content_type, body, ..
            } => {
                let mut response = Response::new(Body::from(body));
                *response.status_mut() = status;
                if let Some(value) = content_type.and_then(|ct| HeaderValue::from_str(&ct).ok()) {
                    response.headers_mut().insert(header::CONTENT_TYPE, value);
                }
                response
            }
            RelayError::RateLimited {
                message,
                retry_after,
            } => {
                let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
                (status, [(header::RETRY_AFTER, HeaderValue::from(secs))], message).into_response()
            }
            other => (status, other.to_string()).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> Bytes {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn upstream_error_is_passed_through() {
        let response = RelayError::Upstream {
            status: StatusCode::TOO_MANY_REQUESTS,
            content_type: Some("application/json".into()),
            body: Bytes::from_static(br#"{"error":"quota"}"#),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/json"
        );
        assert_eq!(body_of(response).await, r#"{"error":"quota"}"#);
    }

    #[tokio::test]
    async fn transport_error_is_500_with_message() {
        let response = RelayError::Transport("connection refused".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "connection refused");
    }

    #[tokio::test]
    async fn rate_limited_rounds_retry_after_up() {
        let response = RelayError::RateLimited {
            message: "slow down".into(),
            retry_after: Duration::from_millis(1500),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
        assert_eq!(body_of(response).await, "slow down");
    }

    #[tokio::test]
    async fn unauthorized_body() {
        let response = RelayError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_of(response).await, "Unauthorized");
    }
}
