// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types live in `dosewatch-core::types` so they can cross
//! adapter trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use dosewatch_core::types::{
    DeliveryOutcome, DeliveryRecord, Destination, DoseTime, DueDose, EntryId, EntryStatus,
    MedicationEntry, NewEntry, Profile,
};
