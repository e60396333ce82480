//! Wire formats for exported events.
//!
//! - CEF v0 encoding with header/extension escaping
//! - RFC 3164-style syslog envelopes

pub mod cef;
pub mod syslog;

use thiserror::Error;

/// Errors from CEF encoding.
///
/// An event that fails encoding is dropped by the caller; resubmitting it
/// would reproduce the same malformed input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// One of the six required header fields was absent (or null) after
    /// upstream enrichment.
    #[error("missing required CEF header field: {field}")]
    MissingHeaderField { field: &'static str },

    /// A header field contained a literal `\n` or `\r` escape sequence.
    /// CEF has no escape for the field separator context, so the value
    /// is rejected rather than escaped.
    #[error("newline sequence in CEF header field {field}")]
    HeaderNewline { field: &'static str },

    /// An extension key contained a literal `\n` or `\r` escape sequence.
    #[error("newline sequence in CEF extension key: {key}")]
    ExtensionKeyNewline { key: String },
}
