// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timing normalization: free-text timing descriptions become concrete
//! `HH:MM` dose slots at ingestion time, never at dispatch time.

use chrono::NaiveTime;
use dosewatch_core::{DosewatchError, DoseTime};

/// Descriptor defaults used when a prescription names a daypart instead of a
/// clock time. Morning/afternoon/evening follow the extraction pipeline's
/// stated defaults.
const DESCRIPTORS: &[(&str, (u32, u32))] = &[
    ("morning", (10, 0)),
    ("breakfast", (8, 0)),
    ("noon", (12, 0)),
    ("midday", (12, 0)),
    ("lunch", (13, 0)),
    ("afternoon", (15, 0)),
    ("evening", (21, 0)),
    ("dinner", (20, 0)),
    ("night", (21, 0)),
    ("bedtime", (22, 0)),
];

/// Clock-time formats accepted from the extractor, tried in order.
const TIME_FORMATS: &[&str] = &["%H:%M", "%I:%M %p", "%I:%M%p", "%I %p", "%I%p"];

/// Resolve a timing description to one or more dose slots.
///
/// Accepts 24-hour and 12-hour clock forms plus daypart descriptors, and
/// multi-dose lists split on commas, slashes, semicolons, and "and". The
/// result is sorted and deduplicated.
pub fn normalize_timing(raw: &str) -> Result<Vec<DoseTime>, DosewatchError> {
    let mut slots = Vec::new();
    for token in split_timing(raw) {
        slots.push(parse_token(&token)?);
    }
    if slots.is_empty() {
        return Err(DosewatchError::Ingestion {
            message: format!("timing `{raw}` contains no recognizable time"),
        });
    }
    slots.sort();
    slots.dedup();
    Ok(slots)
}

fn split_timing(raw: &str) -> Vec<String> {
    raw.replace(['[', ']'], "")
        .replace(" and ", ",")
        .replace(['&', ';', '/'], ",")
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_token(token: &str) -> Result<DoseTime, DosewatchError> {
    let lowered = token.to_lowercase();
    // "at bedtime", "after lunch", "with dinner" resolve to the daypart.
    let bare = lowered
        .strip_prefix("at ")
        .or_else(|| lowered.strip_prefix("after "))
        .or_else(|| lowered.strip_prefix("before "))
        .or_else(|| lowered.strip_prefix("with "))
        .unwrap_or(&lowered);

    for (descriptor, (hour, minute)) in DESCRIPTORS {
        if bare == *descriptor {
            return Ok(DoseTime::from_hm(*hour, *minute)
                .expect("descriptor table holds valid times"));
        }
    }

    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(bare, format) {
            return Ok(DoseTime::from_time(time));
        }
    }

    Err(DosewatchError::Ingestion {
        message: format!("unrecognized timing `{token}`"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(s: &str) -> DoseTime {
        s.parse().unwrap()
    }

    #[test]
    fn twenty_four_hour_clock_passes_through() {
        assert_eq!(normalize_timing("14:45").unwrap(), vec![slot("14:45")]);
        assert_eq!(normalize_timing("8:05").unwrap(), vec![slot("08:05")]);
    }

    #[test]
    fn twelve_hour_forms_are_resolved() {
        assert_eq!(normalize_timing("8:30 pm").unwrap(), vec![slot("20:30")]);
        assert_eq!(normalize_timing("8:30PM").unwrap(), vec![slot("20:30")]);
        assert_eq!(normalize_timing("8 am").unwrap(), vec![slot("08:00")]);
        assert_eq!(normalize_timing("12 am").unwrap(), vec![slot("00:00")]);
        assert_eq!(normalize_timing("12 pm").unwrap(), vec![slot("12:00")]);
    }

    #[test]
    fn descriptors_use_pipeline_defaults() {
        assert_eq!(normalize_timing("morning").unwrap(), vec![slot("10:00")]);
        assert_eq!(normalize_timing("afternoon").unwrap(), vec![slot("15:00")]);
        assert_eq!(normalize_timing("evening").unwrap(), vec![slot("21:00")]);
        assert_eq!(normalize_timing("at bedtime").unwrap(), vec![slot("22:00")]);
        assert_eq!(normalize_timing("After Dinner").unwrap(), vec![slot("20:00")]);
    }

    #[test]
    fn multi_dose_lists_split_sort_and_dedup() {
        assert_eq!(
            normalize_timing("20:00, 10:00").unwrap(),
            vec![slot("10:00"), slot("20:00")]
        );
        assert_eq!(
            normalize_timing("morning and night").unwrap(),
            vec![slot("10:00"), slot("21:00")]
        );
        assert_eq!(
            normalize_timing("[10:00, 22:00]").unwrap(),
            vec![slot("10:00"), slot("22:00")]
        );
        // evening and night share a default; only one slot survives.
        assert_eq!(
            normalize_timing("evening/night").unwrap(),
            vec![slot("21:00")]
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(normalize_timing("whenever").is_err());
        assert!(normalize_timing("").is_err());
        assert!(normalize_timing("25:00").is_err());
        assert!(normalize_timing(", ,").is_err());
    }
}
