//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request on /api/completions:
//!     → auth.rs (shared-secret check, 401 on mismatch)
//!     → rate_limit.rs (per-address window, 429 when exceeded)
//!         uses client_addr.rs to pick the key
//!         uses clock.rs for time
//!     → handler
//! ```

pub mod auth;
pub mod client_addr;
pub mod clock;
pub mod rate_limit;

pub use auth::{auth_middleware, AuthState};
pub use client_addr::ClientAddress;
pub use clock::{Clock, MockClock, SystemClock};
pub use rate_limit::{rate_limit_middleware, RateLimitDecision, RateLimitState, RateLimiter};
