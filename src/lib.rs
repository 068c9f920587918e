//! Prompt relay library.
//!
//! Accepts a chat prompt over HTTP, forwards it to the Gemini API, optionally
//! fires a notification email, and returns the reply text.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod notify;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::RelayConfig;
pub use error::RelayError;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
