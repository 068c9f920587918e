//! Network layer.
//!
//! Plain TCP listeners come straight from Tokio; this module only adds the
//! optional rustls setup used when `listener.tls` is configured.

pub mod tls;

pub use tls::{load_tls_config, TlsError};
