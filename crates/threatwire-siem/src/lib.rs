//! CEF syslog export for threatwire threat-intelligence feeds.
//!
//! This crate provides:
//! - CEF v0 encoding with strict header/extension escaping
//! - RFC 3164-style syslog envelopes (priority + UTC timestamp)
//! - Expansion of IP ranges into minimal CIDR blocks
//! - An asynchronous delivery actor with a bounded queue, lazy
//!   reconnect with a fixed cooldown, and per-transport framing
//! - An output coordinator mapping update/withdraw indicator events
//!   onto the wire

pub mod config;
pub mod delivery;
pub mod expand;
pub mod format;
pub mod models;
pub mod pipeline;
