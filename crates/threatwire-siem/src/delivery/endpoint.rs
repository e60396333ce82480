//! Collector endpoint resolution.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::lookup_host;

use crate::models::Protocol;

/// The configured collector endpoint triple. The protocol stays a string
/// until resolution so reconfiguration takes the same validation path as
/// startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Collector hostname or address; unset means not yet configured.
    pub host: Option<String>,
    /// Collector port.
    pub port: u16,
    /// `TCP` or `UDP`, case-insensitive.
    pub protocol: String,
}

/// An endpoint resolved to a concrete socket address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub addr: SocketAddr,
    pub protocol: Protocol,
}

/// Endpoint resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("collector host is not configured")]
    MissingAddress,

    #[error("address resolution failed for {host}:{port}: {source}")]
    Resolution {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve a host/port/protocol triple to a socket endpoint.
///
/// Returns the first resolved candidate; there is no multi-address
/// failover.
pub async fn resolve(
    host: Option<&str>,
    port: u16,
    protocol: &str,
) -> Result<ResolvedEndpoint, ResolveError> {
    let protocol = Protocol::from_str_value(protocol)
        .ok_or_else(|| ResolveError::UnknownProtocol(protocol.to_string()))?;
    let host = match host {
        Some(host) if !host.is_empty() => host,
        _ => return Err(ResolveError::MissingAddress),
    };

    let mut candidates = lookup_host((host, port))
        .await
        .map_err(|source| ResolveError::Resolution {
            host: host.to_string(),
            port,
            source,
        })?;

    candidates
        .next()
        .map(|addr| ResolvedEndpoint { addr, protocol })
        .ok_or_else(|| ResolveError::Resolution {
            host: host.to_string(),
            port,
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "name resolved to no addresses",
            ),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_resolve_literal_address() {
        let resolved = resolve(Some("127.0.0.1"), 514, "UDP").await.unwrap();
        assert_eq!(resolved.addr, "127.0.0.1:514".parse().unwrap());
        assert_eq!(resolved.protocol, Protocol::Udp);
    }

    #[tokio::test]
    async fn test_resolve_protocol_case_insensitive() {
        let resolved = resolve(Some("127.0.0.1"), 6514, "tcp").await.unwrap();
        assert_eq!(resolved.protocol, Protocol::Tcp);
    }

    #[tokio::test]
    async fn test_unknown_protocol() {
        let err = resolve(Some("127.0.0.1"), 514, "sctp").await.unwrap_err();
        assert!(matches!(err, ResolveError::UnknownProtocol(p) if p == "sctp"));
    }

    #[tokio::test]
    async fn test_missing_host() {
        assert!(matches!(
            resolve(None, 514, "UDP").await.unwrap_err(),
            ResolveError::MissingAddress
        ));
        assert!(matches!(
            resolve(Some(""), 514, "UDP").await.unwrap_err(),
            ResolveError::MissingAddress
        ));
    }

    #[tokio::test]
    async fn test_resolution_failure_wraps_cause() {
        // RFC 2606 reserves `.invalid`; the lookup can never succeed.
        let err = resolve(Some("collector.invalid"), 514, "UDP")
            .await
            .unwrap_err();
        match err {
            ResolveError::Resolution { host, port, .. } => {
                assert_eq!(host, "collector.invalid");
                assert_eq!(port, 514);
            }
            other => panic!("expected Resolution error, got {other:?}"),
        }
    }
}
