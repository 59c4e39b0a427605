// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock notification channel for deterministic testing.
//!
//! `MockChannel` implements `NotificationChannel` with scriptable outcomes
//! and captured delivery attempts for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::sync::Mutex;

use dosewatch_core::error::SendFailure;
use dosewatch_core::traits::adapter::PluginAdapter;
use dosewatch_core::traits::channel::NotificationChannel;
use dosewatch_core::types::{AdapterType, Destination, HealthStatus, MessageId};
use dosewatch_core::DosewatchError;

/// One captured delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub destination: Destination,
    pub body: String,
}

type SendHook = Box<dyn Fn(Destination, String) -> BoxFuture<'static, ()> + Send + Sync>;

/// A mock messaging channel for testing.
///
/// Every call to `send()` is captured as an attempt (success or not), then
/// the next scripted outcome is consumed; an empty script means success.
/// An optional hook runs before the outcome is resolved, letting tests
/// mutate shared state mid-tick (e.g. delete an entry while another is
/// being delivered).
pub struct MockChannel {
    outcomes: Arc<Mutex<VecDeque<Result<(), SendFailure>>>>,
    sent: Arc<Mutex<Vec<SentMessage>>>,
    on_send: Arc<Mutex<Option<SendHook>>>,
}

impl MockChannel {
    /// Create a new mock channel that succeeds on every send.
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            on_send: Arc::new(Mutex::new(None)),
        }
    }

    /// Script the outcome of the next unscripted `send()` call.
    ///
    /// Outcomes are consumed in FIFO order; once the queue is drained,
    /// sends succeed again.
    pub async fn script_outcome(&self, outcome: Result<(), SendFailure>) {
        self.outcomes.lock().await.push_back(outcome);
    }

    /// Install a hook that runs at the start of every `send()` call.
    pub async fn set_on_send<F>(&self, hook: F)
    where
        F: Fn(Destination, String) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        *self.on_send.lock().await = Some(Box::new(hook));
    }

    /// All captured delivery attempts, in call order.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// The number of delivery attempts made so far.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all captured attempts.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, DosewatchError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DosewatchError> {
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for MockChannel {
    async fn send(&self, to: &Destination, body: &str) -> Result<MessageId, SendFailure> {
        let hook_future = {
            let hook = self.on_send.lock().await;
            hook.as_ref().map(|h| h(to.clone(), body.to_string()))
        };
        if let Some(fut) = hook_future {
            fut.await;
        }

        self.sent.lock().await.push(SentMessage {
            destination: to.clone(),
            body: body.to_string(),
        });

        let outcome = self.outcomes.lock().await.pop_front().unwrap_or(Ok(()));
        outcome.map(|()| MessageId(format!("mock-msg-{}", uuid::Uuid::new_v4())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_captures_attempts_and_defaults_to_success() {
        let channel = MockChannel::new();
        let to = Destination("whatsapp:+15550001111".into());

        let id = channel.send(&to, "take your meds").await.unwrap();
        assert!(id.0.starts_with("mock-msg-"));

        let sent = channel.sent_messages().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].body, "take your meds");
        assert_eq!(sent[0].destination, to);
    }

    #[tokio::test]
    async fn scripted_outcomes_are_consumed_in_order() {
        let channel = MockChannel::new();
        let to = Destination("whatsapp:+15550001111".into());

        channel
            .script_outcome(Err(SendFailure::transient("service busy")))
            .await;
        channel
            .script_outcome(Err(SendFailure::permanent("bad number")))
            .await;

        let first = channel.send(&to, "a").await.unwrap_err();
        assert!(first.is_transient());
        let second = channel.send(&to, "b").await.unwrap_err();
        assert!(!second.is_transient());
        // Script drained: back to success.
        assert!(channel.send(&to, "c").await.is_ok());

        // Failed attempts are still counted as attempts.
        assert_eq!(channel.sent_count().await, 3);
    }

    #[tokio::test]
    async fn on_send_hook_runs_before_capture() {
        let channel = Arc::new(MockChannel::new());
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let seen_clone = seen.clone();
        channel
            .set_on_send(move |_to, body| {
                let seen = seen_clone.clone();
                Box::pin(async move {
                    seen.lock().await.push(body);
                })
            })
            .await;

        let to = Destination("whatsapp:+15550001111".into());
        channel.send(&to, "hooked").await.unwrap();
        assert_eq!(seen.lock().await.as_slice(), ["hooked"]);
    }

    #[tokio::test]
    async fn clear_sent_resets_counter() {
        let channel = MockChannel::new();
        let to = Destination("whatsapp:+15550001111".into());
        channel.send(&to, "x").await.unwrap();
        assert_eq!(channel.sent_count().await, 1);
        channel.clear_sent().await;
        assert_eq!(channel.sent_count().await, 0);
    }
}
