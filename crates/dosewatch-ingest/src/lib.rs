// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prescription ingestion boundary for the Dosewatch reminder service.
//!
//! Consumes the normalized `{name, dosage, timing}` records produced by the
//! external OCR + text-understanding pipeline, validates their shape,
//! resolves timings to concrete `HH:MM` slots, and replaces the user's
//! stored schedule.

pub mod normalize;
pub mod pipeline;

pub use normalize::normalize_timing;
pub use pipeline::{ingest_prescription, normalize_records, parse_extraction, ExtractedMedication};
