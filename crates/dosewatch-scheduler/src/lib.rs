// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reminder dispatch scheduler for the Dosewatch reminder service.
//!
//! The [`DispatchScheduler`] scans the schedule store on each tick and
//! triggers exactly one notification per medication per scheduled time,
//! across process restarts, overlapping schedules, and downstream channel
//! failures. The [`SchedulerManager`] owns scheduler lifecycles, one per
//! monitored destination.

pub mod dispatch;
pub mod manager;
pub mod shutdown;
pub mod window;

pub use dispatch::DispatchScheduler;
pub use manager::{HandleState, SchedulerHandle, SchedulerManager};
pub use window::TickWindow;
