//! TLS certificate loading for the listener.

use axum_server::tls_rustls::RustlsConfig;
use std::path::Path;
use thiserror::Error;

use crate::config::TlsConfig;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("{kind} file not found: {path}")]
    Missing { kind: &'static str, path: String },

    #[error("failed to load TLS material: {0}")]
    Load(#[from] std::io::Error),
}

/// Build a rustls configuration from the PEM files named in `config`.
pub async fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, TlsError> {
    for (kind, path) in [("Certificate", &config.cert_path), ("Private key", &config.key_path)] {
        if !Path::new(path).exists() {
            return Err(TlsError::Missing {
                kind,
                path: path.clone(),
            });
        }
    }

    Ok(RustlsConfig::from_pem_file(&config.cert_path, &config.key_path).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_certificate_is_reported() {
        let err = load_tls_config(&TlsConfig {
            cert_path: "/nonexistent/cert.pem".into(),
            key_path: "/nonexistent/key.pem".into(),
        })
        .await
        .unwrap_err();

        assert!(matches!(err, TlsError::Missing { kind: "Certificate", .. }));
    }
}
