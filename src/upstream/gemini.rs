//! Client for the Gemini `generateContent` endpoint.
//!
//! One call per prompt: no retry, no backoff, no streaming. The request runs
//! until upstream answers or the configured timeout fires.

use axum::http::header;
use std::time::{Duration, Instant};

use crate::config::UpstreamConfig;
use crate::observability::metrics;
use crate::upstream::types::{GenerateContentRequest, GenerateContentResponse, UpstreamError};

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `generateContent` URL without the key, safe to log.
    pub fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }

    /// Send `prompt` as a single user turn and return the reply text.
    pub async fn generate(&self, prompt: Option<&str>) -> Result<String, UpstreamError> {
        let start = Instant::now();
        let result = self.send(prompt).await;
        let outcome = match &result {
            Ok(_) => "ok",
            Err(UpstreamError::Status { .. }) => "status",
            Err(UpstreamError::Transport(_)) => "transport",
        };
        metrics::record_upstream(outcome, start);
        result
    }

    async fn send(&self, prompt: Option<&str>) -> Result<String, UpstreamError> {
        let endpoint = self.endpoint();
        let response = self
            .http
            .post(&endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&GenerateContentRequest::single_turn(prompt))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(endpoint = %endpoint, error = %e, "Error communicating with Gemini API");
                UpstreamError::Transport(e.without_url().to_string())
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                body = %String::from_utf8_lossy(&body),
                "Gemini API error"
            );
            return Err(UpstreamError::Status {
                status,
                content_type,
                body,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(error = %e, "Gemini API returned malformed JSON");
            UpstreamError::Transport(format!("invalid JSON from upstream: {e}"))
        })?;

        Ok(parsed.into_reply())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_base_and_model() {
        let config = UpstreamConfig {
            base_url: "https://example.test/v1beta/".into(),
            api_key: "k".into(),
            ..Default::default()
        };
        let client = GeminiClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-pro:generateContent"
        );
        assert!(!client.endpoint().contains("key="));
    }
}
