// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dosewatch serve` command implementation.
//!
//! Opens the schedule store, builds the WhatsApp channel, and starts one
//! dispatch scheduler per stored profile. Scheduler activation is explicit:
//! a restarted process fires nothing until this re-invokes `ensure_started`
//! for each destination. Supports graceful shutdown via signal handlers.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use dosewatch_config::model::DosewatchConfig;
use dosewatch_core::{
    DosewatchError, HealthStatus, NotificationChannel, PluginAdapter, ScheduleStore,
};
use dosewatch_scheduler::{shutdown, SchedulerManager};
use dosewatch_storage::SqliteScheduleStore;
use dosewatch_whatsapp::WhatsAppChannel;

/// Runs the `dosewatch serve` command.
pub async fn run_serve(config: DosewatchConfig) -> Result<(), DosewatchError> {
    init_tracing(&config.app.log_level);
    info!("starting dosewatch serve");

    let store = Arc::new(SqliteScheduleStore::new(config.storage.clone()));
    store.initialize().await?;

    let send_timeout = Duration::from_secs(config.scheduler.send_timeout_secs);
    let channel = WhatsAppChannel::new(&config.twilio, send_timeout).map_err(|e| {
        error!(error = %e, "failed to initialize WhatsApp channel");
        eprintln!(
            "error: Twilio credentials required. Set twilio.account_sid, \
             twilio.auth_token, and twilio.from_number in dosewatch.toml \
             (or DOSEWATCH_TWILIO_* environment variables)."
        );
        e
    })?;
    let channel = Arc::new(channel);

    match channel.health_check().await? {
        HealthStatus::Healthy => info!("WhatsApp channel healthy"),
        HealthStatus::Degraded(reason) => warn!(reason = %reason, "WhatsApp channel degraded"),
        HealthStatus::Unhealthy(reason) => {
            // Transient outages should not block startup; deliveries will be
            // recorded as failures and retried under the attempt cap.
            warn!(reason = %reason, "WhatsApp channel unhealthy at startup");
        }
    }

    let manager = Arc::new(SchedulerManager::new(
        store.clone() as Arc<dyn ScheduleStore>,
        channel.clone() as Arc<dyn NotificationChannel>,
        config.scheduler.clone(),
    ));

    let profiles = store.list_profiles().await?;
    if profiles.is_empty() {
        warn!("no profiles configured; run `dosewatch profile set <user> <whatsapp>` first");
    }
    for profile in &profiles {
        manager
            .ensure_started(&profile.user_id, &profile.destination)
            .await;
    }
    info!(
        schedulers = manager.running_count().await,
        poll_interval_secs = config.scheduler.poll_interval_secs,
        "dispatch schedulers running"
    );

    let cancel = shutdown::install_signal_handler();
    cancel.cancelled().await;

    manager.stop_all().await;
    store.shutdown().await?;
    info!("dosewatch serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dosewatch={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
