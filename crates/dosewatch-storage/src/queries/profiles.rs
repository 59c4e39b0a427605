// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profile operations (user -> reminder destination).

use dosewatch_core::DosewatchError;
use rusqlite::params;

use crate::database::Database;
use crate::models::{Destination, Profile};

/// Create or update the destination for a user.
pub async fn upsert_profile(
    db: &Database,
    user_id: &str,
    destination: &Destination,
) -> Result<(), DosewatchError> {
    let user_id = user_id.to_string();
    let destination = destination.0.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO profiles (user_id, whatsapp) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET
                     whatsapp = excluded.whatsapp,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![user_id, destination],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The configured destination for a user, if any.
pub async fn get_destination(
    db: &Database,
    user_id: &str,
) -> Result<Option<Destination>, DosewatchError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                "SELECT whatsapp FROM profiles WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(number) => Ok(Some(Destination(number))),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// All profiles, ascending by user id.
pub async fn list_profiles(db: &Database) -> Result<Vec<Profile>, DosewatchError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, whatsapp, created_at, updated_at
                 FROM profiles ORDER BY user_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Profile {
                    user_id: row.get(0)?,
                    destination: Destination(row.get(1)?),
                    created_at: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
