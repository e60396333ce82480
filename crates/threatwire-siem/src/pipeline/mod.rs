//! Output coordination.
//!
//! Manages the flow for one update/withdraw event: inject the indicator
//! and method into the value mapping, expand IP ranges, evaluate the
//! external template, encode the CEF body, wrap it in a syslog envelope,
//! and enqueue it on the delivery actor.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::{CefOutputConfig, ConfigError};
use crate::delivery::endpoint::Endpoint;
use crate::delivery::sender::{DeliveryStats, SyslogSender};
use crate::expand::expand;
use crate::format::{cef, syslog, EncodeError};
use crate::models::{FieldSet, Operation};

/// Template evaluation failure reported by the host platform's engine.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("template evaluation failed: {0}")]
pub struct TemplateError(pub String);

/// Errors surfaced synchronously to the event producer. The offending
/// event is dropped, not retried: resubmission would reproduce the same
/// malformed input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OutputError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// The external template-evaluation contract.
///
/// Given the event's value mapping plus the injected `__indicator` and
/// `__method` keys, produce the field set to encode. Template compilation
/// and versioning live entirely in the host platform.
pub trait FieldMapper: Send + Sync {
    fn render(
        &self,
        data: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<FieldSet, TemplateError>;
}

/// Snapshot of the output statistics, pulled on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputStats {
    pub updates_processed: u64,
    pub withdraws_processed: u64,
    pub transmitted: u64,
    pub dropped: u64,
    pub send_errors: u64,
}

/// CEF syslog output node.
///
/// One instance owns one delivery actor. Update/withdraw calls are
/// synchronous and non-blocking; delivery happens on the actor's worker
/// task.
pub struct CefOutput {
    name: String,
    external_id: String,
    priority: u8,
    mapper: Box<dyn FieldMapper>,
    sender: SyslogSender,
    updates: AtomicU64,
    withdraws: AtomicU64,
}

impl CefOutput {
    /// Validate the configuration and start the delivery actor.
    ///
    /// `name` becomes the injected `deviceProcessName` extension. Must be
    /// called from within a Tokio runtime.
    pub fn new(
        name: impl Into<String>,
        mapper: Box<dyn FieldMapper>,
        config: &CefOutputConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let priority = config.priority()?;

        let mut sender = SyslogSender::new(
            config.endpoint(),
            config.queue_capacity,
            config.retry_cooldown(),
        );
        sender.start();

        Ok(Self {
            name: name.into(),
            external_id: config.external_id.clone(),
            priority,
            mapper,
            sender,
            updates: AtomicU64::new(0),
            withdraws: AtomicU64::new(0),
        })
    }

    /// Process an indicator update.
    pub fn update(
        &self,
        indicator: &str,
        value: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), OutputError> {
        self.updates.fetch_add(1, Ordering::Relaxed);
        self.emit(Operation::Update, indicator, value)
    }

    /// Process an indicator withdrawal.
    pub fn withdraw(
        &self,
        indicator: &str,
        value: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), OutputError> {
        self.withdraws.fetch_add(1, Ordering::Relaxed);
        self.emit(Operation::Withdraw, indicator, value)
    }

    fn emit(
        &self,
        operation: Operation,
        indicator: &str,
        value: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), OutputError> {
        let indicator_type = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default();

        // A range indicator fans out into one wire message per CIDR
        // block. Render and encode everything before enqueueing anything
        // so a malformed event leaves no partial output behind.
        let mut lines = Vec::new();
        for expanded in expand(indicator, indicator_type) {
            let mut data = value.clone();
            data.insert(
                "__indicator".to_string(),
                serde_json::Value::String(expanded),
            );
            data.insert(
                "__method".to_string(),
                serde_json::Value::String(operation.as_str().to_string()),
            );

            let fields = self.mapper.render(&data)?;
            let body = cef::encode(fields, &self.name, &self.external_id)?;
            debug!(name = %self.name, operation = %operation, "emit {body}");
            lines.push(syslog::wrap(self.priority, &body));
        }

        for line in lines {
            self.sender.enqueue(line);
        }
        Ok(())
    }

    /// Replace the collector endpoint; the actor re-resolves before its
    /// next connection attempt.
    pub fn set_endpoint(&self, host: Option<String>, port: u16, protocol: String) {
        self.sender.set_endpoint(Endpoint {
            host,
            port,
            protocol,
        });
    }

    /// Snapshot the output statistics.
    pub fn stats(&self) -> OutputStats {
        let DeliveryStats {
            transmitted,
            dropped,
            send_errors,
        } = self.sender.stats();
        OutputStats {
            updates_processed: self.updates.load(Ordering::Relaxed),
            withdraws_processed: self.withdraws.load(Ordering::Relaxed),
            transmitted,
            dropped,
            send_errors,
        }
    }

    /// Stop the delivery actor, discarding anything still queued.
    pub async fn shutdown(&mut self) {
        self.sender.shutdown().await;
    }
}
