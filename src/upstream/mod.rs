//! Upstream generation API.
//!
//! # Data Flow
//! ```text
//! prompt
//!     → types.rs (single-turn generateContent payload)
//!     → gemini.rs (POST {base}/{model}:generateContent?key=…)
//!     → 2xx: first candidate's first part text, or fallback reply
//!     → non-2xx: status + body verbatim
//!     → network / decode failure: transport error message
//! ```

pub mod gemini;
pub mod types;

pub use gemini::GeminiClient;
pub use types::{UpstreamError, FALLBACK_REPLY};
