// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Schedule store trait for medication schedules and the delivery log.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::DosewatchError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    DeliveryOutcome, DeliveryRecord, Destination, DoseTime, DueDose, EntryId, EntryStatus,
    MedicationEntry, NewEntry, Profile,
};

/// Adapter for the durable medication schedule and delivery audit trail.
///
/// All mutations are serialized by the backend; the dispatch scheduler relies
/// on that to re-validate an entry immediately before delivery without racing
/// concurrent deletes.
#[async_trait]
pub trait ScheduleStore: PluginAdapter {
    /// Initializes the storage backend (migrations, connections).
    async fn initialize(&self) -> Result<(), DosewatchError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), DosewatchError>;

    // --- Medication entries ---

    /// Replaces the user's whole schedule in one transaction
    /// (delete-then-reinsert, the ingestion semantics).
    async fn replace_entries(
        &self,
        user_id: &str,
        entries: &[NewEntry],
    ) -> Result<Vec<EntryId>, DosewatchError>;

    /// Inserts a single entry with status `Scheduled`.
    async fn insert_entry(&self, user_id: &str, entry: &NewEntry)
        -> Result<EntryId, DosewatchError>;

    /// Deletes by (user, name, dosage, slot) match. Returns whether a row went away.
    async fn delete_entry(
        &self,
        user_id: &str,
        name: &str,
        dosage: &str,
        slot: DoseTime,
    ) -> Result<bool, DosewatchError>;

    /// Updates only the lifecycle status of an entry.
    async fn set_status(&self, id: EntryId, status: EntryStatus) -> Result<(), DosewatchError>;

    /// Lists a user's entries in ascending (name, id) order.
    async fn list_entries(&self, user_id: &str) -> Result<Vec<MedicationEntry>, DosewatchError>;

    /// True when the entry exists and is not cancelled. This is the existence
    /// re-check performed immediately before a delivery attempt.
    async fn entry_deliverable(&self, id: EntryId) -> Result<bool, DosewatchError>;

    // --- Due-occurrence queries ---

    /// Due occurrences for one user whose slot falls in `[from, to]` on `date`
    /// (both ends inclusive), excluding cancelled entries, in ascending
    /// (name, slot) order.
    async fn list_due(
        &self,
        user_id: &str,
        date: NaiveDate,
        from: DoseTime,
        to: DoseTime,
    ) -> Result<Vec<DueDose>, DosewatchError>;

    /// Occurrences on `date` whose only recorded attempts failed transiently
    /// and which are still under `max_attempts`, for same-day retry.
    async fn list_retryable(
        &self,
        user_id: &str,
        date: NaiveDate,
        max_attempts: u32,
    ) -> Result<Vec<DueDose>, DosewatchError>;

    // --- Delivery log ---

    /// True when a successful delivery is already recorded for the occurrence.
    async fn has_delivery(
        &self,
        id: EntryId,
        date: NaiveDate,
        slot: DoseTime,
    ) -> Result<bool, DosewatchError>;

    /// Appends a delivery record. Returns the 1-based attempt ordinal.
    async fn record_delivery(
        &self,
        id: EntryId,
        date: NaiveDate,
        slot: DoseTime,
        outcome: DeliveryOutcome,
    ) -> Result<u32, DosewatchError>;

    /// All delivery records for a calendar date, newest first.
    async fn list_deliveries_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<DeliveryRecord>, DosewatchError>;

    // --- Profiles ---

    /// Creates or updates the destination for a user.
    async fn upsert_profile(
        &self,
        user_id: &str,
        destination: &Destination,
    ) -> Result<(), DosewatchError>;

    /// The configured destination for a user, if any.
    async fn get_destination(&self, user_id: &str)
        -> Result<Option<Destination>, DosewatchError>;

    /// All profiles, ascending by user id.
    async fn list_profiles(&self) -> Result<Vec<Profile>, DosewatchError>;
}
