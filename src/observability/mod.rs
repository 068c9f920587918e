//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! Request IDs (`x-request-id`) are attached by the HTTP layer and show up
//! in the `tower_http` trace spans.

pub mod logging;
pub mod metrics;
