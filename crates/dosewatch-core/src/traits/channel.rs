// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification channel trait for outbound reminder delivery.

use async_trait::async_trait;

use crate::error::SendFailure;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Destination, MessageId};

/// Adapter for an outbound messaging transport.
///
/// A channel either accepts and queues a message (returning the transport's
/// message id) or fails with a classified [`SendFailure`]. Implementations
/// must bound each attempt with a timeout; no delivery-order guarantee is
/// made across concurrent calls.
#[async_trait]
pub trait NotificationChannel: PluginAdapter {
    /// Attempts to deliver `body` to `to` exactly once.
    async fn send(&self, to: &Destination, body: &str) -> Result<MessageId, SendFailure>;
}
