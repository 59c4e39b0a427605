// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the ScheduleStore trait.

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::OnceCell;
use tracing::debug;

use dosewatch_config::model::StorageConfig;
use dosewatch_core::types::{
    DeliveryOutcome, DeliveryRecord, Destination, DoseTime, DueDose, EntryId, EntryStatus,
    MedicationEntry, NewEntry, Profile,
};
use dosewatch_core::{
    AdapterType, DosewatchError, HealthStatus, PluginAdapter, ScheduleStore,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed schedule store.
///
/// Wraps a [`Database`] handle and delegates all query operations to the
/// typed query modules. The database is lazily opened on the first call to
/// [`ScheduleStore::initialize`].
pub struct SqliteScheduleStore {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteScheduleStore {
    /// Create a new store with the given configuration.
    ///
    /// The database connection is not opened until [`initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, DosewatchError> {
        self.db.get().ok_or_else(|| DosewatchError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteScheduleStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DosewatchError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DosewatchError> {
        if let Some(db) = self.db.get() {
            db.close().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl ScheduleStore for SqliteScheduleStore {
    async fn initialize(&self) -> Result<(), DosewatchError> {
        let db = Database::open(&self.config.database_path, self.config.wal_mode).await?;
        self.db.set(db).map_err(|_| DosewatchError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite schedule store initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), DosewatchError> {
        self.db()?.close().await
    }

    async fn replace_entries(
        &self,
        user_id: &str,
        entries: &[NewEntry],
    ) -> Result<Vec<EntryId>, DosewatchError> {
        queries::medications::replace_entries(self.db()?, user_id, entries).await
    }

    async fn insert_entry(
        &self,
        user_id: &str,
        entry: &NewEntry,
    ) -> Result<EntryId, DosewatchError> {
        queries::medications::insert_entry(self.db()?, user_id, entry).await
    }

    async fn delete_entry(
        &self,
        user_id: &str,
        name: &str,
        dosage: &str,
        slot: DoseTime,
    ) -> Result<bool, DosewatchError> {
        queries::medications::delete_entry(self.db()?, user_id, name, dosage, slot).await
    }

    async fn set_status(&self, id: EntryId, status: EntryStatus) -> Result<(), DosewatchError> {
        queries::medications::set_status(self.db()?, id, status).await
    }

    async fn list_entries(&self, user_id: &str) -> Result<Vec<MedicationEntry>, DosewatchError> {
        queries::medications::list_entries(self.db()?, user_id).await
    }

    async fn entry_deliverable(&self, id: EntryId) -> Result<bool, DosewatchError> {
        queries::medications::entry_deliverable(self.db()?, id).await
    }

    async fn list_due(
        &self,
        user_id: &str,
        date: NaiveDate,
        from: DoseTime,
        to: DoseTime,
    ) -> Result<Vec<DueDose>, DosewatchError> {
        queries::medications::list_due(self.db()?, user_id, date, from, to).await
    }

    async fn list_retryable(
        &self,
        user_id: &str,
        date: NaiveDate,
        max_attempts: u32,
    ) -> Result<Vec<DueDose>, DosewatchError> {
        queries::deliveries::list_retryable(self.db()?, user_id, date, max_attempts).await
    }

    async fn has_delivery(
        &self,
        id: EntryId,
        date: NaiveDate,
        slot: DoseTime,
    ) -> Result<bool, DosewatchError> {
        queries::deliveries::has_delivery(self.db()?, id, date, slot).await
    }

    async fn record_delivery(
        &self,
        id: EntryId,
        date: NaiveDate,
        slot: DoseTime,
        outcome: DeliveryOutcome,
    ) -> Result<u32, DosewatchError> {
        queries::deliveries::record_delivery(self.db()?, id, date, slot, outcome).await
    }

    async fn list_deliveries_on(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<DeliveryRecord>, DosewatchError> {
        queries::deliveries::list_deliveries_on(self.db()?, date).await
    }

    async fn upsert_profile(
        &self,
        user_id: &str,
        destination: &Destination,
    ) -> Result<(), DosewatchError> {
        queries::profiles::upsert_profile(self.db()?, user_id, destination).await
    }

    async fn get_destination(
        &self,
        user_id: &str,
    ) -> Result<Option<Destination>, DosewatchError> {
        queries::profiles::get_destination(self.db()?, user_id).await
    }

    async fn list_profiles(&self) -> Result<Vec<Profile>, DosewatchError> {
        queries::profiles::list_profiles(self.db()?).await
    }
}
