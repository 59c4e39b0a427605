// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.

pub mod adapter;
pub mod channel;
pub mod store;

pub use adapter::PluginAdapter;
pub use channel::NotificationChannel;
pub use store::ScheduleStore;
