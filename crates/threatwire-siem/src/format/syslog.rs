//! Syslog envelope construction.
//!
//! Priorities follow the RFC 3164 `level + facility*8` encoding with the
//! name tables the product has always shipped. The timestamp format
//! carries no year or timezone; that loss of precision is a known
//! limitation of the envelope format.

use chrono::{DateTime, Utc};

use crate::config::ConfigError;

/// Syslog level names and codes.
pub const SYSLOG_LEVELS: [(&str, u8); 20] = [
    ("KERN", 0),
    ("USER", 1),
    ("MAIL", 2),
    ("DAEMON", 3),
    ("AUTH", 4),
    ("SYSLOG", 5),
    ("LPR", 6),
    ("NEWS", 7),
    ("UUCP", 8),
    ("CRON", 9),
    ("AUTHPRIV", 10),
    ("FTP", 11),
    ("LOCAL0", 16),
    ("LOCAL1", 17),
    ("LOCAL2", 18),
    ("LOCAL3", 19),
    ("LOCAL4", 20),
    ("LOCAL5", 21),
    ("LOCAL6", 22),
    ("LOCAL7", 23),
];

/// Syslog facility names and codes.
pub const SYSLOG_FACILITIES: [(&str, u8); 8] = [
    ("EMERG", 0),
    ("ALERT", 1),
    ("CRIT", 2),
    ("ERR", 3),
    ("WARNING", 4),
    ("NOTICE", 5),
    ("INFO", 6),
    ("DEBUG", 7),
];

/// Look up a level code by name. Lookup is case-insensitive.
pub fn level_code(name: &str) -> Option<u8> {
    let upper = name.to_ascii_uppercase();
    SYSLOG_LEVELS
        .iter()
        .find(|(level, _)| *level == upper)
        .map(|(_, code)| *code)
}

/// Look up a facility code by name. Names must match exactly.
pub fn facility_code(name: &str) -> Option<u8> {
    SYSLOG_FACILITIES
        .iter()
        .find(|(facility, _)| *facility == name)
        .map(|(_, code)| *code)
}

/// Compute the syslog priority for a level/facility name pair.
///
/// Unknown names are configuration errors: fatal at startup, never
/// retried.
pub fn priority(level: &str, facility: &str) -> Result<u8, ConfigError> {
    let level = level_code(level).ok_or_else(|| ConfigError::UnknownLevel(level.to_string()))?;
    let facility =
        facility_code(facility).ok_or_else(|| ConfigError::UnknownFacility(facility.to_string()))?;
    Ok(level + facility * 8)
}

/// Wrap a message body in a syslog envelope stamped at `timestamp`.
pub fn wrap_at(priority: u8, body: &str, timestamp: DateTime<Utc>) -> String {
    format!(
        "<{}>{} {}",
        priority,
        timestamp.format("%b %d %H:%M:%S"),
        body
    )
}

/// Wrap a message body in a syslog envelope stamped with the current UTC
/// wall clock (send time, not event time).
pub fn wrap(priority: u8, body: &str) -> String {
    wrap_at(priority, body, Utc::now())
}
