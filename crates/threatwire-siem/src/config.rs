//! Output configuration.
//!
//! The host platform loads and deserializes this structure; the crate
//! validates the syslog coding and protocol once at startup. Unknown
//! level, facility, or protocol names are hard configuration failures.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::delivery::endpoint::Endpoint;
use crate::format::syslog;
use crate::models::Protocol;

/// Configuration validation errors. Fatal at startup, never retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown syslog level: {0}")]
    UnknownLevel(String),

    #[error("unknown syslog facility: {0}")]
    UnknownFacility(String),

    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),
}

/// Configuration for a CEF syslog output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CefOutputConfig {
    /// Collector hostname or address. Delivery idles until set.
    pub host: Option<String>,
    /// Collector port.
    pub port: u16,
    /// Wire transport, `TCP` or `UDP` (case-insensitive).
    pub protocol: String,
    /// Syslog level name.
    pub level: String,
    /// Syslog facility name.
    pub facility: String,
    /// Value for the injected `deviceExternalId` extension.
    pub external_id: String,
    /// Delivery queue capacity; `0` means unbounded.
    pub queue_capacity: usize,
    /// Cooldown between delivery attempts after a send failure.
    pub retry_cooldown_secs: u64,
}

impl Default for CefOutputConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 514,
            protocol: "UDP".to_string(),
            level: "SYSLOG".to_string(),
            facility: "INFO".to_string(),
            external_id: String::new(),
            queue_capacity: 1000,
            retry_cooldown_secs: 60,
        }
    }
}

impl CefOutputConfig {
    /// Resolve the configured level/facility names to a syslog priority.
    pub fn priority(&self) -> Result<u8, ConfigError> {
        syslog::priority(&self.level, &self.facility)
    }

    /// Validate the full configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.priority()?;
        Protocol::from_str_value(&self.protocol)
            .ok_or_else(|| ConfigError::UnknownProtocol(self.protocol.clone()))?;
        Ok(())
    }

    /// The delivery endpoint triple.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.host.clone(),
            port: self.port,
            protocol: self.protocol.clone(),
        }
    }

    /// The retry cooldown as a [`Duration`].
    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_secs(self.retry_cooldown_secs)
    }
}
