//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the upstream client, notifier and rate limiter from config
//! - Create the Axum router and wire middleware (auth, rate limit, request
//!   ID, tracing, CORS, body limit, timeout)
//! - Serve plain HTTP or TLS with graceful shutdown
//! - Run the rate-limit sweeper alongside the server

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{validate_config, RelayConfig, ValidationError};
use crate::http::completions::completions;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::HealthResponse;
use crate::lifecycle::shutdown;
use crate::net::{load_tls_config, TlsError};
use crate::notify::{Notifier, NotifyError, ResendNotifier};
use crate::security::rate_limit::spawn_sweeper;
use crate::security::{
    auth_middleware, rate_limit_middleware, AuthState, RateLimitState, RateLimiter,
};
use crate::upstream::{GeminiClient, UpstreamError};

pub const COMPLETIONS_PATH: &str = "/api/completions";
pub const HEALTH_PATH: &str = "/health";

/// Errors that stop the server from starting or serving.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Config(Vec<ValidationError>),

    #[error("upstream client: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("notifier: {0}")]
    Notify(#[from] NotifyError),

    #[error("TLS: {0}")]
    Tls(#[from] TlsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Notification switch and per-send bound, as seen by the handler.
#[derive(Clone, Copy, Debug)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub timeout: Duration,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: GeminiClient,
    pub notifier: Arc<dyn Notifier>,
    pub notifications: NotificationSettings,
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    config: RelayConfig,
    limiter: Arc<RateLimiter>,
}

impl RelayServer {
    /// Create a server with the Resend notifier and a system-clock limiter.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let notifier = Arc::new(ResendNotifier::new(&config.notification)?);
        Self::with_notifier(config, notifier)
    }

    /// Create a server with a caller-supplied notifier.
    pub fn with_notifier(config: RelayConfig, notifier: Arc<dyn Notifier>) -> Result<Self, ServerError> {
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        Self::with_components(config, notifier, limiter)
    }

    /// Create a server from fully injected components.
    ///
    /// The configuration is validated here as well, so embedders that skip
    /// `load_config` cannot start with a zero window or an empty token.
    pub fn with_components(
        config: RelayConfig,
        notifier: Arc<dyn Notifier>,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ServerError::Config)?;

        let state = AppState {
            upstream: GeminiClient::new(&config.upstream)?,
            notifier,
            notifications: NotificationSettings {
                enabled: config.notification.enabled,
                timeout: Duration::from_secs(config.notification.timeout_secs),
            },
        };

        let router = Self::build_router(&config, state, limiter.clone());
        Ok(Self {
            router,
            config,
            limiter,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState, limiter: Arc<RateLimiter>) -> Router {
        let auth = AuthState::new(config.auth.token.as_str());
        let rate_limit = RateLimitState {
            limiter,
            trust_proxy_headers: config.security.trust_proxy_headers,
            message: config.rate_limit.message.as_str().into(),
        };

        // route_layer: the last one added runs first, so auth precedes the limiter.
        let api = Router::new()
            .route(COMPLETIONS_PATH, post(completions))
            .route_layer(middleware::from_fn_with_state(rate_limit, rate_limit_middleware))
            .route_layer(middleware::from_fn_with_state(auth, auth_middleware));

        Router::new()
            .merge(api)
            .route(HEALTH_PATH, get(health))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.security.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CorsLayer::permissive())
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Router for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Shared rate limiter.
    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        let rustls = match &self.config.listener.tls {
            Some(tls) => Some(load_tls_config(tls).await?),
            None => None,
        };

        let sweeper = spawn_sweeper(self.limiter.clone(), shutdown.resubscribe());
        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        match rustls {
            Some(rustls) => {
                tracing::info!("Server is running on https://{}{}", addr, COMPLETIONS_PATH);

                let handle = axum_server::Handle::new();
                let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
                let shutdown_handle = handle.clone();
                tokio::spawn(async move {
                    shutdown::wait(shutdown).await;
                    shutdown_handle.graceful_shutdown(Some(grace));
                });

                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
            None => {
                tracing::info!("Server is running on http://{}{}", addr, COMPLETIONS_PATH);

                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown::wait(shutdown))
                    .await?;
            }
        }

        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
