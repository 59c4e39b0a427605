// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Dosewatch reminder service.
//!
//! This crate provides the foundational trait definitions, error types, and
//! domain types used throughout the Dosewatch workspace. The schedule store
//! and notification channel backends implement traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{DosewatchError, FailureKind, SendFailure};
pub use types::{
    AdapterType, Destination, DoseTime, EntryId, EntryStatus, HealthStatus, MessageId,
};

// Re-export adapter traits at crate root.
pub use traits::{NotificationChannel, PluginAdapter, ScheduleStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;
        for variant in [AdapterType::Channel, AdapterType::Storage] {
            let s = variant.to_string();
            assert_eq!(AdapterType::from_str(&s).unwrap(), variant);
        }
    }

    #[test]
    fn trait_objects_are_constructible() {
        // Compile-time check that the traits stay object safe: the scheduler
        // holds both behind Arc<dyn _>.
        fn _store(_: std::sync::Arc<dyn ScheduleStore>) {}
        fn _channel(_: std::sync::Arc<dyn NotificationChannel>) {}
    }

    #[test]
    fn error_variants_construct() {
        let _ = DosewatchError::Config("bad".into());
        let _ = DosewatchError::Storage {
            source: Box::new(std::io::Error::other("disk")),
        };
        let _ = DosewatchError::Channel {
            message: "no credentials".into(),
            source: None,
        };
        let _ = DosewatchError::Ingestion {
            message: "missing dosage".into(),
        };
        let _ = DosewatchError::SchedulerStopped {
            destination: "whatsapp:+1".into(),
        };
        let _ = DosewatchError::Timeout {
            duration: std::time::Duration::from_secs(15),
        };
        let _ = DosewatchError::Internal("unexpected".into());
    }
}
