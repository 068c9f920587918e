//! Shared-secret authorization.
//!
//! The `Authorization` header must equal the configured token exactly. No
//! scheme prefix is expected and the comparison is plain string equality.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::RelayError;

/// State for the authorization middleware.
#[derive(Clone)]
pub struct AuthState {
    pub token: Arc<str>,
}

impl AuthState {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self { token: token.into() }
    }

    /// True when `presented` matches the configured token.
    pub fn authorizes(&self, presented: Option<&str>) -> bool {
        presented == Some(&*self.token)
    }
}

/// Rejects the request with `401 Unauthorized` before any other work.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if state.authorizes(presented) {
        return next.run(request).await;
    }

    tracing::debug!(has_header = presented.is_some(), "Rejected unauthorized request");
    RelayError::Unauthorized.into_response()
}
