// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Dosewatch workspace.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{DosewatchError, FailureKind};

/// Row identifier of a medication entry in the schedule store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub i64);

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned to an outbound message by the notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// External address reminders for a user are sent to (e.g. a WhatsApp number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination(pub String);

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A time-of-day slot at minute resolution.
///
/// Stored and displayed as zero-padded 24-hour `HH:MM`, so the SQLite text
/// ordering of slots matches their chronological ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DoseTime(u16);

impl DoseTime {
    /// Construct from hour and minute. Returns `None` out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self((hour * 60 + minute) as u16))
        } else {
            None
        }
    }

    /// The slot covering the minute of the given wall-clock time.
    pub fn from_time(time: NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    pub fn hour(&self) -> u32 {
        u32::from(self.0) / 60
    }

    pub fn minute(&self) -> u32 {
        u32::from(self.0) % 60
    }

    /// The slot's instant on the given calendar date (seconds are zero).
    pub fn on(&self, date: NaiveDate) -> chrono::NaiveDateTime {
        date.and_hms_opt(self.hour(), self.minute(), 0)
            .expect("minute-of-day is always a valid time")
    }
}

impl std::fmt::Display for DoseTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl std::str::FromStr for DoseTime {
    type Err = DosewatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (h, m) = s.split_once(':').ok_or_else(|| DosewatchError::Ingestion {
            message: format!("timing `{s}` is not in HH:MM format"),
        })?;
        let hour: u32 = h.trim().parse().map_err(|_| DosewatchError::Ingestion {
            message: format!("timing `{s}` has a non-numeric hour"),
        })?;
        let minute: u32 = m.trim().parse().map_err(|_| DosewatchError::Ingestion {
            message: format!("timing `{s}` has a non-numeric minute"),
        })?;
        Self::from_hm(hour, minute).ok_or_else(|| DosewatchError::Ingestion {
            message: format!("timing `{s}` is out of range"),
        })
    }
}

impl TryFrom<String> for DoseTime {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse().map_err(|e: DosewatchError| e.to_string())
    }
}

impl From<DoseTime> for String {
    fn from(t: DoseTime) -> Self {
        t.to_string()
    }
}

/// Lifecycle status of a medication entry.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    /// Waiting for its next occurrence.
    Scheduled,
    /// The most recent occurrence was delivered.
    Delivered,
    /// Withdrawn; never dispatched again.
    Cancelled,
}

/// Outcome of one delivery attempt, as persisted in the delivery log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    TransientFailure,
    PermanentFailure,
}

impl From<FailureKind> for DeliveryOutcome {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::Transient => DeliveryOutcome::TransientFailure,
            FailureKind::Permanent => DeliveryOutcome::PermanentFailure,
        }
    }
}

/// A stored medication entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationEntry {
    pub id: EntryId,
    pub user_id: String,
    pub name: String,
    pub dosage: String,
    /// Ordered dose times; one reminder fires per slot per day.
    pub times: Vec<DoseTime>,
    pub status: EntryStatus,
}

/// A medication entry about to be inserted (no identity yet, always `Scheduled`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEntry {
    pub name: String,
    pub dosage: String,
    pub times: Vec<DoseTime>,
}

/// One row of the append-only delivery audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: i64,
    pub entry_id: EntryId,
    pub occurred_on: NaiveDate,
    pub slot: DoseTime,
    pub outcome: DeliveryOutcome,
    /// 1-based attempt ordinal for this (entry, date, slot) occurrence.
    pub attempt: u32,
    pub attempted_at: String,
}

/// A due occurrence returned by the schedule store for one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueDose {
    pub entry_id: EntryId,
    pub user_id: String,
    pub name: String,
    pub dosage: String,
    pub slot: DoseTime,
    pub occurred_on: NaiveDate,
    /// Attempts already recorded for this occurrence (0 for fresh matches).
    pub prior_attempts: u32,
}

/// A user profile mapping to a reminder destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub destination: Destination,
    pub created_at: String,
    pub updated_at: String,
}

/// What the dispatch scheduler did about one due occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchAction {
    /// Exactly one message was accepted by the channel.
    Delivered { message_id: MessageId },
    /// The channel rejected the attempt; recorded, not retried this tick.
    Failed { kind: FailureKind, error: String },
    /// A successful delivery record already exists for this occurrence.
    SkippedDuplicate,
    /// The entry was deleted or cancelled between the due query and delivery.
    SkippedMissing,
}

/// Per-occurrence result within a [`DispatchReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub entry_id: EntryId,
    pub name: String,
    pub slot: DoseTime,
    pub occurred_on: NaiveDate,
    pub action: DispatchAction,
}

/// The outcome of one scheduler tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub dispatches: Vec<Dispatch>,
}

impl DispatchReport {
    pub fn is_empty(&self) -> bool {
        self.dispatches.is_empty()
    }

    pub fn delivered(&self) -> usize {
        self.count(|a| matches!(a, DispatchAction::Delivered { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|a| matches!(a, DispatchAction::Failed { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|a| {
            matches!(
                a,
                DispatchAction::SkippedDuplicate | DispatchAction::SkippedMissing
            )
        })
    }

    fn count(&self, pred: impl Fn(&DispatchAction) -> bool) -> usize {
        self.dispatches.iter().filter(|d| pred(&d.action)).count()
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dose_time_parses_and_displays_zero_padded() {
        let t: DoseTime = "8:05".parse().unwrap();
        assert_eq!(t.to_string(), "08:05");
        assert_eq!((t.hour(), t.minute()), (8, 5));
    }

    #[test]
    fn dose_time_rejects_out_of_range() {
        assert!("24:00".parse::<DoseTime>().is_err());
        assert!("12:60".parse::<DoseTime>().is_err());
        assert!("noonish".parse::<DoseTime>().is_err());
    }

    #[test]
    fn dose_time_text_order_is_chronological() {
        let morning: DoseTime = "08:00".parse().unwrap();
        let night: DoseTime = "21:30".parse().unwrap();
        assert!(morning < night);
        assert!(morning.to_string() < night.to_string());
    }

    #[test]
    fn dose_time_serde_round_trip() {
        let t: DoseTime = "14:45".parse().unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"14:45\"");
        let back: DoseTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn status_and_outcome_round_trip_through_strings() {
        use std::str::FromStr;
        for status in [
            EntryStatus::Scheduled,
            EntryStatus::Delivered,
            EntryStatus::Cancelled,
        ] {
            assert_eq!(EntryStatus::from_str(&status.to_string()).unwrap(), status);
        }
        for outcome in [
            DeliveryOutcome::Delivered,
            DeliveryOutcome::TransientFailure,
            DeliveryOutcome::PermanentFailure,
        ] {
            assert_eq!(
                DeliveryOutcome::from_str(&outcome.to_string()).unwrap(),
                outcome
            );
        }
    }

    #[test]
    fn report_counts_by_action() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let slot: DoseTime = "10:00".parse().unwrap();
        let mk = |action| Dispatch {
            entry_id: EntryId(1),
            name: "Paracetamol".to_string(),
            slot,
            occurred_on: date,
            action,
        };
        let report = DispatchReport {
            dispatches: vec![
                mk(DispatchAction::Delivered {
                    message_id: MessageId("m1".into()),
                }),
                mk(DispatchAction::Failed {
                    kind: FailureKind::Transient,
                    error: "timeout".into(),
                }),
                mk(DispatchAction::SkippedDuplicate),
            ],
        };
        assert_eq!(report.delivered(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(!report.is_empty());
    }
}
