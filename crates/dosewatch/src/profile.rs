// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dosewatch profile` subcommands.

use std::sync::Arc;

use clap::Subcommand;

use dosewatch_config::model::DosewatchConfig;
use dosewatch_core::types::Destination;
use dosewatch_core::{DosewatchError, ScheduleStore};
use dosewatch_storage::SqliteScheduleStore;

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Set (or replace) the WhatsApp destination for a user.
    Set {
        user: String,
        /// E.164 number, with or without the `whatsapp:` prefix.
        whatsapp: String,
    },
    /// List all profiles.
    List,
}

pub async fn run_profile(
    config: DosewatchConfig,
    action: ProfileAction,
) -> Result<(), DosewatchError> {
    let store = Arc::new(SqliteScheduleStore::new(config.storage.clone()));
    store.initialize().await?;

    match action {
        ProfileAction::Set { user, whatsapp } => {
            let bare = whatsapp.strip_prefix("whatsapp:").unwrap_or(&whatsapp);
            if !bare.starts_with('+') || bare.len() < 8 {
                return Err(DosewatchError::Config(format!(
                    "`{whatsapp}` is not an E.164 number like +15550001111"
                )));
            }
            store
                .upsert_profile(&user, &Destination(whatsapp.clone()))
                .await?;
            println!("profile set: {user} -> {whatsapp}");
        }
        ProfileAction::List => {
            let profiles = store.list_profiles().await?;
            if profiles.is_empty() {
                println!("no profiles configured");
            }
            for profile in profiles {
                println!("{} -> {}", profile.user_id, profile.destination);
            }
        }
    }
    Ok(())
}
