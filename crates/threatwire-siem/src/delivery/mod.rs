//! Best-effort delivery of formatted messages to a remote collector.
//!
//! - Endpoint resolution (host/port/protocol to socket address)
//! - The delivery actor: bounded queue, single persistent connection,
//!   retry with fixed cooldown, TCP/UDP framing

pub mod endpoint;
pub mod sender;

use thiserror::Error;

/// Errors recovered locally by the delivery actor. These never reach
/// message producers; each one triggers close-and-retry-after-cooldown.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("address resolution failed: {0}")]
    Resolve(#[from] endpoint::ResolveError),

    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),
}
