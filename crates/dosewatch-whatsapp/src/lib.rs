// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Twilio WhatsApp channel adapter for the Dosewatch reminder service.
//!
//! Implements [`NotificationChannel`] against the Twilio Messages API:
//! a form-encoded POST with basic auth, a bounded per-attempt timeout, and
//! failure classification so the scheduler knows what is worth retrying
//! (429 and 5xx are transient, other 4xx are permanent).

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use dosewatch_config::model::TwilioConfig;
use dosewatch_core::error::SendFailure;
use dosewatch_core::traits::{NotificationChannel, PluginAdapter};
use dosewatch_core::types::{AdapterType, Destination, HealthStatus, MessageId};
use dosewatch_core::DosewatchError;

/// Twilio WhatsApp channel implementing [`NotificationChannel`].
pub struct WhatsAppChannel {
    http: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from: String,
    api_base: String,
}

impl WhatsAppChannel {
    /// Creates a new channel from Twilio credentials.
    ///
    /// Requires `account_sid`, `auth_token`, and `from_number` to be set;
    /// `send_timeout` bounds each delivery attempt end to end.
    pub fn new(config: &TwilioConfig, send_timeout: Duration) -> Result<Self, DosewatchError> {
        let account_sid = require(config.account_sid.as_deref(), "twilio.account_sid")?;
        let auth_token = require(config.auth_token.as_deref(), "twilio.auth_token")?;
        let from_number = require(config.from_number.as_deref(), "twilio.from_number")?;

        let http = reqwest::Client::builder()
            .timeout(send_timeout)
            .build()
            .map_err(|e| DosewatchError::Channel {
                message: "failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from: with_whatsapp_prefix(from_number),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }

    fn account_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}.json", self.api_base, self.account_sid)
    }
}

fn require<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, DosewatchError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DosewatchError::Config(format!(
            "{key} is required for the WhatsApp channel"
        ))),
    }
}

/// Twilio addresses WhatsApp endpoints as `whatsapp:+E164`.
fn with_whatsapp_prefix(number: &str) -> String {
    if number.starts_with("whatsapp:") {
        number.to_string()
    } else {
        format!("whatsapp:{number}")
    }
}

/// Pull the human-readable error message out of a Twilio error body, if any.
fn twilio_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl PluginAdapter for WhatsAppChannel {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, DosewatchError> {
        let response = self
            .http
            .get(self.account_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await;
        match response {
            Ok(resp) if resp.status().is_success() => Ok(HealthStatus::Healthy),
            Ok(resp) => Ok(HealthStatus::Unhealthy(format!(
                "Twilio account endpoint returned {}",
                resp.status()
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Twilio unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), DosewatchError> {
        debug!("WhatsApp channel shutting down");
        Ok(())
    }
}

#[async_trait]
impl NotificationChannel for WhatsAppChannel {
    async fn send(&self, to: &Destination, body: &str) -> Result<MessageId, SendFailure> {
        let to_addr = with_whatsapp_prefix(&to.0);
        let form = [("To", to_addr.as_str()), ("From", self.from.as_str()), ("Body", body)];

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                // Timeouts and connection errors may clear on a later attempt.
                SendFailure::transient(format!("request failed: {e}"))
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SendFailure::transient(format!("failed to read response: {e}")))?;

        if status.is_success() {
            let sid = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v.get("sid").and_then(|s| s.as_str()).map(str::to_string))
                .ok_or_else(|| {
                    SendFailure::transient("Twilio response missing message sid".to_string())
                })?;
            debug!(to = %to_addr, sid = %sid, "WhatsApp message accepted");
            return Ok(MessageId(sid));
        }

        let detail = twilio_error_message(&text).unwrap_or_else(|| format!("HTTP {status}"));
        let failure = if status.as_u16() == 429 || status.is_server_error() {
            SendFailure::transient(detail)
        } else {
            SendFailure::permanent(detail)
        };
        warn!(to = %to_addr, status = %status, kind = %failure.kind, "WhatsApp send failed");
        Err(failure)
    }
}
