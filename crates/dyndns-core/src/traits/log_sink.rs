//! Destination for user-facing updater messages

use serde::{Deserialize, Serialize};

/// Severity attached to a log sink message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Normal operation
    Info,
    /// Something the user must act on or know about
    Critical,
}

/// Receives messages meant for the user, as opposed to diagnostic tracing
pub trait LogSink: Send + Sync {
    /// Record a message
    fn add_message(&self, message: &str, severity: Severity);
}

/// Log sink that forwards to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn add_message(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Info => tracing::info!(target: "dyndns", "{}", message),
            Severity::Critical => tracing::error!(target: "dyndns", "{}", message),
        }
    }
}
