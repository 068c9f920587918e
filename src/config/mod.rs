//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env file (optional, loaded in main)
//! config file (TOML, optional, named by RELAY_CONFIG)
//!     → loader.rs (parse & deserialize, overlay environment)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → cloned into handler state at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, EnvSource, SystemEnv};
pub use schema::{
    AuthConfig, ListenerConfig, NotificationConfig, ObservabilityConfig, RateLimitConfig,
    RelayConfig, SecurityConfig, TimeoutConfig, TlsConfig, UpstreamConfig,
};
pub use validation::{validate_config, ValidationError};
