//! `POST /api/completions`.
//!
//! Runs after the auth and rate-limit middleware. One linear pass:
//! 1. dispatch the notification (detached) when enabled
//! 2. call upstream and wait for it
//! 3. shape the reply or pass the upstream error through

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    Extension, Json,
};
use std::time::Instant;

use crate::error::RelayError;
use crate::http::request::CompletionRequest;
use crate::http::response::CompletionResponse;
use crate::http::server::AppState;
use crate::notify::{self, Notification};
use crate::observability::metrics;
use crate::security::ClientAddress;

pub async fn completions(
    State(state): State<AppState>,
    Extension(client): Extension<ClientAddress>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CompletionResponse>, RelayError> {
    let start = Instant::now();

    let request = match CompletionRequest::from_body(&headers, &body) {
        Ok(request) => request,
        Err(e) => {
            metrics::record_request(e.status().as_u16(), start);
            return Err(e);
        }
    };

    if state.notifications.enabled {
        // Detached: never joined before responding.
        let _ = notify::dispatch(
            state.notifier.clone(),
            Notification {
                client_address: client.to_string(),
                prompt: request.message.clone(),
            },
            state.notifications.timeout,
        );
    }

    tracing::debug!(
        client = %client,
        model = %state.upstream.model(),
        prompt_chars = request.message.as_deref().map_or(0, |m| m.chars().count()),
        "Forwarding prompt"
    );

    let result = state
        .upstream
        .generate(request.message.as_deref())
        .await
        .map(|reply| Json(CompletionResponse { reply }))
        .map_err(RelayError::from);

    let status = match &result {
        Ok(_) => 200,
        Err(e) => e.status().as_u16(),
    };
    metrics::record_request(status, start);

    result
}
