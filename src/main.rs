//! Prompt relay.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                 PROMPT RELAY                  │
//!   POST /api/completions│  ┌──────┐   ┌────────────┐   ┌─────────────┐  │
//!   ─────────────────────┼─▶│ auth │──▶│ rate limit │──▶│ completions │──┼──▶ Gemini API
//!                        │  └──────┘   └────────────┘   └──────┬──────┘  │
//!                        │                                      │ detached│
//!                        │                                      ▼        │
//!                        │                               ┌────────────┐  │
//!                        │                               │   notify   │──┼──▶ Resend
//!                        │                               └────────────┘  │
//!                        │  config · observability · lifecycle · net/tls │
//!                        └───────────────────────────────────────────────┘
//! ```

use prompt_relay::config::{load_config, SystemEnv};
use prompt_relay::lifecycle::signals::spawn_signal_handler;
use prompt_relay::observability::{logging, metrics};
use prompt_relay::{RelayServer, Shutdown};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is not an error.
    let dotenv = dotenvy::dotenv();

    let config = load_config(&SystemEnv)?;
    logging::init_tracing(&config.observability);

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded .env");
    }
    tracing::info!("prompt-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        model = %config.upstream.model,
        rate_limit_window_secs = config.rate_limit.window_secs,
        rate_limit_max = config.rate_limit.max_requests,
        notifications = config.notification.enabled,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = RelayServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
