//! Client address resolution.
//!
//! The first present source wins:
//! 1. `X-Real-IP` (address reported by a fronting proxy)
//! 2. first entry of `X-Forwarded-For`
//! 3. socket peer address
//!
//! Header values are not validated as IP addresses. With
//! `trust_proxy_headers = false` only the peer address is used.

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use std::fmt;
use std::net::SocketAddr;

pub const X_REAL_IP: &str = "x-real-ip";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Address used as the rate-limit key and in notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientAddress(pub String);

impl ClientAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the client address from headers and the peer socket.
pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> ClientAddress {
    if trust_proxy_headers {
        if let Some(ip) = header_str(headers, X_REAL_IP) {
            return ClientAddress(ip.to_string());
        }
        if let Some(first) = header_str(headers, X_FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return ClientAddress(first.to_string());
        }
    }

    match peer {
        Some(addr) => ClientAddress(addr.ip().to_string()),
        None => ClientAddress("unknown".to_string()),
    }
}

/// Resolve using the `ConnectInfo` the server attaches to each request.
pub fn resolve_request<B>(request: &Request<B>, trust_proxy_headers: bool) -> ClientAddress {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    resolve(request.headers(), peer, trust_proxy_headers)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
