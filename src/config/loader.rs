//! Configuration loading from an optional TOML file and the environment.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::{RelayConfig, TlsConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Names the TOML file used as the base layer.
pub const CONFIG_PATH_VAR: &str = "RELAY_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Read-only view of process environment variables.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
pub struct SystemEnv;

impl EnvSource for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Load, overlay and validate configuration.
///
/// The file named by `RELAY_CONFIG` (if any) is parsed first, then the
/// environment overrides individual fields.
pub fn load_config<E: EnvSource>(env: &E) -> Result<RelayConfig, ConfigError> {
    let base = match env.var(CONFIG_PATH_VAR).filter(|p| !p.is_empty()) {
        Some(path) => load_file(Path::new(&path))?,
        None => RelayConfig::default(),
    };

    let config = apply_env(base, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML configuration file without validating it.
pub fn load_file(path: &Path) -> Result<RelayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Overlay recognised environment variables onto `config`.
pub fn apply_env<E: EnvSource>(mut config: RelayConfig, env: &E) -> Result<RelayConfig, ConfigError> {
    let host = env.var("RELAY_HOST").filter(|h| !h.is_empty());
    let port = env.var("PORT");
    if host.is_some() || port.is_some() {
        let (current_host, current_port) = split_bind(&config.listener.bind_address);
        let port = match port {
            Some(p) => parse_var::<u16>("PORT", p)?,
            None => current_port,
        };
        let host = host.unwrap_or(current_host);
        config.listener.bind_address = format!("{host}:{port}");
    }

    match (env.var("TLS_CERT_PATH"), env.var("TLS_KEY_PATH")) {
        (None, None) => {}
        (cert, key) => {
            config.listener.tls = Some(TlsConfig {
                cert_path: cert.unwrap_or_default(),
                key_path: key.unwrap_or_default(),
            });
        }
    }

    if let Some(token) = env.var("VITE_AUTH_TOKEN") {
        config.auth.token = token;
    }

    if let Some(v) = env.var("RATE_LIMIT_WINDOW_SECS") {
        config.rate_limit.window_secs = parse_var("RATE_LIMIT_WINDOW_SECS", v)?;
    }
    if let Some(v) = env.var("RATE_LIMIT_MAX") {
        config.rate_limit.max_requests = parse_var("RATE_LIMIT_MAX", v)?;
    }

    if let Some(key) = env.var("GEMINI_API_KEY") {
        config.upstream.api_key = key;
    }
    if let Some(model) = env.var("GEMINI_MODEL_NAME").filter(|m| !m.is_empty()) {
        config.upstream.model = model;
    }
    if let Some(url) = env.var("GEMINI_BASE_URL") {
        config.upstream.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(v) = env.var("UPSTREAM_TIMEOUT_SECS") {
        config.upstream.timeout_secs = parse_var("UPSTREAM_TIMEOUT_SECS", v)?;
    }

    // Only the literal "true" enables notifications.
    if let Some(flag) = env.var("IS_RESEND_ENABLE") {
        config.notification.enabled = flag == "true";
    }
    if let Some(key) = env.var("RESEND_API_KEY") {
        config.notification.api_key = key;
    }
    if let Some(to) = env.var("RESEND_EMAIL") {
        config.notification.recipient = to;
    }
    if let Some(from) = env.var("RESEND_FROM") {
        config.notification.sender = from;
    }
    if let Some(url) = env.var("RESEND_BASE_URL") {
        config.notification.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(v) = env.var("NOTIFICATION_TIMEOUT_SECS") {
        config.notification.timeout_secs = parse_var("NOTIFICATION_TIMEOUT_SECS", v)?;
    }

    if let Some(v) = env.var("REQUEST_TIMEOUT_SECS") {
        config.timeouts.request_secs = parse_var("REQUEST_TIMEOUT_SECS", v)?;
    }
    if let Some(v) = env.var("MAX_BODY_BYTES") {
        config.security.max_body_bytes = parse_var("MAX_BODY_BYTES", v)?;
    }
    if let Some(v) = env.var("TRUST_PROXY_HEADERS") {
        config.security.trust_proxy_headers = parse_bool("TRUST_PROXY_HEADERS", v)?;
    }

    if let Some(level) = env.var("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(v) = env.var("METRICS_ENABLED") {
        config.observability.metrics_enabled = parse_bool("METRICS_ENABLED", v)?;
    }
    if let Some(addr) = env.var("METRICS_ADDRESS") {
        config.observability.metrics_address = addr;
    }

    Ok(config)
}

fn split_bind(bind: &str) -> (String, u16) {
    match bind.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(8080)),
        None => ("0.0.0.0".to_string(), 8080),
    }
}

fn parse_var<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidEnv { key, value })
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidEnv { key, value }),
    }
}
