//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits so a TOML file can provide the base layer;
//! environment variables are applied on top by the loader.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default upstream model when `GEMINI_MODEL_NAME` is not set.
pub const DEFAULT_MODEL: &str = "models/gemini-pro";

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Shared-secret authorization.
    pub auth: AuthConfig,

    /// Per-client rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Generative-language API settings.
    pub upstream: UpstreamConfig,

    /// Best-effort email notification settings.
    pub notification: NotificationConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits and header trust.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Shared-secret authorization.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Value the `Authorization` header must equal exactly.
    pub token: String,
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Requests allowed per client address within one window.
    pub max_requests: u32,

    /// Body returned with 429 responses.
    pub message: String,
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 600,
            max_requests: 10,
            message: "Too many requests from this IP, please try again later.".to_string(),
        }
    }
}

/// Upstream generation API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// API root, without trailing slash.
    pub base_url: String,

    /// Model path segment, e.g. "models/gemini-pro".
    pub model: String,

    /// API key passed as the `key` query parameter.
    pub api_key: String,

    /// Total time allowed for one upstream call, in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

/// Notification (email) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Send a notification for every accepted prompt.
    pub enabled: bool,

    /// Provider API key (Bearer token).
    pub api_key: String,

    /// Recipient address.
    pub recipient: String,

    /// Sender address.
    pub sender: String,

    /// Provider API root.
    pub base_url: String,

    /// Upper bound for one detached send, in seconds.
    pub timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            recipient: String::new(),
            sender: "prompt-relay@resend.dev".to_string(),
            base_url: "https://api.resend.com".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Grace period for in-flight requests on shutdown, in seconds.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 120,
            shutdown_grace_secs: 10,
        }
    }
}

/// Request limits and proxy header trust.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Take the client address from `X-Real-IP` / `X-Forwarded-For` when present.
    pub trust_proxy_headers: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 100 * 1024,
            trust_proxy_headers: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
