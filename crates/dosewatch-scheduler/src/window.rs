// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tick-window computation for due-slot matching.
//!
//! A dose slot is an instant at second zero of its minute. Each tick covers
//! the slot instants in `(prev_tick, now]`; consecutive windows are therefore
//! disjoint, so a slot is matched by exactly one tick regardless of poll
//! latency. This replaces matching the current `HH:MM` string, which
//! re-fires within a minute and skips minutes that fall between polls.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use dosewatch_core::DoseTime;

/// A contiguous inclusive range of dose slots on one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRange {
    pub date: NaiveDate,
    pub from: DoseTime,
    pub to: DoseTime,
}

/// The slot instants covered by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickWindow {
    /// First covered slot instant.
    lower: NaiveDateTime,
    /// Last covered slot instant.
    upper: NaiveDateTime,
}

impl TickWindow {
    /// Window for a tick at `now` when the previous tick ran at `prev`.
    ///
    /// Covers slot instants strictly after `prev` up to and including `now`.
    pub fn between(prev: NaiveDateTime, now: NaiveDateTime) -> Self {
        Self {
            lower: floor_minute(prev) + Duration::minutes(1),
            upper: floor_minute(now),
        }
    }

    /// Window for the first tick of a scheduler: the current minute only.
    ///
    /// Earlier minutes are deliberately not covered: a restarted process
    /// does not back-fill occurrences missed while it was down.
    pub fn first(now: NaiveDateTime) -> Self {
        let minute = floor_minute(now);
        Self {
            lower: minute,
            upper: minute,
        }
    }

    /// True when no slot instant is covered (sub-minute tick spacing, or a
    /// backwards clock step).
    pub fn is_empty(&self) -> bool {
        self.lower > self.upper
    }

    /// The covered slots as per-date inclusive ranges, splitting at midnight.
    pub fn segments(&self) -> Vec<SlotRange> {
        if self.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut date = self.lower.date();
        while date <= self.upper.date() {
            let from = if date == self.lower.date() {
                DoseTime::from_time(self.lower.time())
            } else {
                midnight()
            };
            let to = if date == self.upper.date() {
                DoseTime::from_time(self.upper.time())
            } else {
                end_of_day()
            };
            out.push(SlotRange { date, from, to });
            date = date.succ_opt().expect("date range stays representable");
        }
        out
    }
}

fn floor_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.date()
        .and_hms_opt(dt.hour(), dt.minute(), 0)
        .expect("truncating to the minute keeps the time valid")
}

fn midnight() -> DoseTime {
    DoseTime::from_hm(0, 0).expect("00:00 is in range")
}

fn end_of_day() -> DoseTime {
    DoseTime::from_hm(23, 59).expect("23:59 is in range")
}
