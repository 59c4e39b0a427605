// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Dosewatch reminder service.

use thiserror::Error;

/// The primary error type used across all Dosewatch adapter traits and core operations.
#[derive(Debug, Error)]
pub enum DosewatchError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Notification channel errors (connection failure, malformed credentials).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed or incomplete records from the upstream extraction pipeline.
    /// Surfaced to the caller before any schedule mutation occurs.
    #[error("ingestion error: {message}")]
    Ingestion { message: String },

    /// Operating on a scheduler handle that has already been stopped.
    #[error("scheduler for destination {destination} is already stopped")]
    SchedulerStopped { destination: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Whether a delivery failure is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FailureKind {
    /// The channel was temporarily unavailable (timeouts, rate limits, 5xx).
    Transient,
    /// The destination is invalid or unreachable long-term (most 4xx).
    Permanent,
}

/// A failed delivery attempt through a [`NotificationChannel`](crate::NotificationChannel).
///
/// Kept separate from [`DosewatchError`] so the dispatch scheduler can
/// classify outcomes without string matching.
#[derive(Debug, Clone, Error)]
#[error("{kind} delivery failure: {message}")]
pub struct SendFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SendFailure {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Permanent,
            message: message.into(),
        }
    }

    /// True when the failure may clear on a later attempt.
    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_failure_classification() {
        assert!(SendFailure::transient("rate limited").is_transient());
        assert!(!SendFailure::permanent("unknown number").is_transient());
    }

    #[test]
    fn send_failure_display_includes_kind() {
        let f = SendFailure::transient("connection reset");
        assert_eq!(f.to_string(), "transient delivery failure: connection reset");
    }

    #[test]
    fn scheduler_stopped_names_destination() {
        let e = DosewatchError::SchedulerStopped {
            destination: "whatsapp:+15550001111".to_string(),
        };
        assert!(e.to_string().contains("whatsapp:+15550001111"));
    }
}
