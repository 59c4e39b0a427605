// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as positive intervals and a plausible sender number.

use crate::diagnostic::ConfigError;
use crate::model::DosewatchConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DosewatchConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if config.scheduler.poll_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.poll_interval_secs must be at least 1".to_string(),
        });
    }

    if config.scheduler.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.max_attempts must be at least 1".to_string(),
        });
    }

    if config.scheduler.send_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "scheduler.send_timeout_secs must be at least 1".to_string(),
        });
    }

    if config.twilio.api_base.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "twilio.api_base must not be empty".to_string(),
        });
    }

    // The sender must be a phone number; the whatsapp: prefix is optional
    // and added by the channel when missing.
    if let Some(from) = config.twilio.from_number.as_deref() {
        let bare = from.strip_prefix("whatsapp:").unwrap_or(from);
        if !bare.starts_with('+') || bare.len() < 8 {
            errors.push(ConfigError::Validation {
                message: format!(
                    "twilio.from_number `{from}` must be an E.164 number like +15550001111"
                ),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = DosewatchConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = DosewatchConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("database_path"))
        ));
    }

    #[test]
    fn zero_poll_interval_fails_validation() {
        let mut config = DosewatchConfig::default();
        config.scheduler.poll_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("poll_interval_secs"))
        ));
    }

    #[test]
    fn zero_max_attempts_fails_validation() {
        let mut config = DosewatchConfig::default();
        config.scheduler.max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn bad_from_number_fails_validation() {
        let mut config = DosewatchConfig::default();
        config.twilio.from_number = Some("555-0111".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("from_number"))
        ));
    }

    #[test]
    fn prefixed_from_number_validates() {
        let mut config = DosewatchConfig::default();
        config.twilio.from_number = Some("whatsapp:+15550001111".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = DosewatchConfig::default();
        config.storage.database_path = "".to_string();
        config.scheduler.poll_interval_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
