// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dosewatch status` command implementation.

use std::sync::Arc;

use chrono::Local;

use dosewatch_config::model::DosewatchConfig;
use dosewatch_core::types::DeliveryOutcome;
use dosewatch_core::{DosewatchError, ScheduleStore};
use dosewatch_storage::SqliteScheduleStore;

/// Runs the `dosewatch status` command: profiles, schedules, and today's
/// delivery activity.
pub async fn run_status(config: DosewatchConfig) -> Result<(), DosewatchError> {
    let store = Arc::new(SqliteScheduleStore::new(config.storage.clone()));
    store.initialize().await?;

    println!("database: {}", config.storage.database_path);

    let profiles = store.list_profiles().await?;
    if profiles.is_empty() {
        println!("no profiles configured");
    }
    for profile in &profiles {
        println!("\n{} -> {}", profile.user_id, profile.destination);
        let entries = store.list_entries(&profile.user_id).await?;
        if entries.is_empty() {
            println!("  (no medications scheduled)");
        }
        for entry in &entries {
            let times: Vec<String> = entry.times.iter().map(|t| t.to_string()).collect();
            println!(
                "  {} {} at {} [{}]",
                entry.name,
                entry.dosage,
                times.join(", "),
                entry.status
            );
        }
    }

    let today = Local::now().date_naive();
    let deliveries = store.list_deliveries_on(today).await?;
    let delivered = deliveries
        .iter()
        .filter(|d| d.outcome == DeliveryOutcome::Delivered)
        .count();
    println!(
        "\ntoday ({today}): {} attempts, {} delivered, {} failed",
        deliveries.len(),
        delivered,
        deliveries.len() - delivered
    );

    Ok(())
}
