//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, tracing, CORS, limits)
//!     → security::auth (401 on secret mismatch)
//!     → security::rate_limit (429 over quota, attaches ClientAddress)
//!     → completions.rs (notify, call upstream)
//!     → response.rs / error.rs (shape reply or pass error through)
//!     → Send to client
//! ```

pub mod completions;
pub mod request;
pub mod response;
pub mod server;

pub use request::{CompletionRequest, X_REQUEST_ID};
pub use response::{CompletionResponse, HealthResponse};
pub use server::{AppState, RelayServer, ServerError, COMPLETIONS_PATH, HEALTH_PATH};
