// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Dosewatch integration tests.

pub mod harness;
pub mod mock_channel;

pub use harness::{entry, open_temp_store};
pub use mock_channel::{MockChannel, SentMessage};
