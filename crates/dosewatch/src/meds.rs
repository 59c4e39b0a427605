// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dosewatch meds` subcommands: manual schedule management.

use std::sync::Arc;

use clap::Subcommand;

use dosewatch_config::model::DosewatchConfig;
use dosewatch_core::types::NewEntry;
use dosewatch_core::{DosewatchError, ScheduleStore};
use dosewatch_ingest::normalize_timing;
use dosewatch_storage::SqliteScheduleStore;

#[derive(Subcommand, Debug)]
pub enum MedsAction {
    /// Add one medication entry.
    Add {
        user: String,
        name: String,
        dosage: String,
        /// One or more times: `14:45`, `8am`, `bedtime`, `morning and night`.
        #[arg(required = true)]
        times: Vec<String>,
    },
    /// List a user's medications.
    List { user: String },
    /// Remove an entry by exact name, dosage, and time match.
    Remove {
        user: String,
        name: String,
        dosage: String,
        time: String,
    },
}

pub async fn run_meds(config: DosewatchConfig, action: MedsAction) -> Result<(), DosewatchError> {
    let store = Arc::new(SqliteScheduleStore::new(config.storage.clone()));
    store.initialize().await?;

    match action {
        MedsAction::Add {
            user,
            name,
            dosage,
            times,
        } => {
            let mut slots = Vec::new();
            for raw in &times {
                slots.extend(normalize_timing(raw)?);
            }
            slots.sort();
            slots.dedup();
            let entry = NewEntry {
                name: name.clone(),
                dosage: dosage.clone(),
                times: slots.clone(),
            };
            store.insert_entry(&user, &entry).await?;
            let rendered: Vec<String> = slots.iter().map(|s| s.to_string()).collect();
            println!("added: {name} {dosage} at {}", rendered.join(", "));
        }
        MedsAction::List { user } => {
            let entries = store.list_entries(&user).await?;
            if entries.is_empty() {
                println!("no medications scheduled for {user}");
            }
            for entry in entries {
                let times: Vec<String> = entry.times.iter().map(|t| t.to_string()).collect();
                println!(
                    "{} {} at {} [{}]",
                    entry.name,
                    entry.dosage,
                    times.join(", "),
                    entry.status
                );
            }
        }
        MedsAction::Remove {
            user,
            name,
            dosage,
            time,
        } => {
            let slot = time.parse()?;
            if store.delete_entry(&user, &name, &dosage, slot).await? {
                println!("removed: {name} {dosage} at {time}");
            } else {
                println!("no matching entry for {name} {dosage} at {time}");
            }
        }
    }
    Ok(())
}
