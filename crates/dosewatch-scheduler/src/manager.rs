// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler lifecycle manager: at most one dispatch scheduler per
//! destination, idempotent start, graceful stop.
//!
//! The handle table replaces a process-wide "scheduler started" flag: each
//! destination gets its own polling lifecycle, keyed and serialized through
//! one mutex-guarded map. Handles move `Running -> Stopping -> Stopped`;
//! `Stopped` is terminal and a fresh generation must be started instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dosewatch_config::model::SchedulerConfig;
use dosewatch_core::{Destination, DosewatchError, NotificationChannel, ScheduleStore};

use crate::dispatch::DispatchScheduler;

/// Lifecycle state of a scheduler handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandleState {
    Running = 0,
    Stopping = 1,
    Stopped = 2,
}

/// Cloneable reference to a live (or stopped) scheduler generation.
#[derive(Clone)]
pub struct SchedulerHandle {
    id: uuid::Uuid,
    destination: Destination,
    cancel: CancellationToken,
    state: Arc<AtomicU8>,
}

impl SchedulerHandle {
    fn new(destination: Destination, cancel: CancellationToken) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            destination,
            cancel,
            state: Arc::new(AtomicU8::new(HandleState::Running as u8)),
        }
    }

    /// Generation identity; two `ensure_started` calls on a running
    /// destination observe the same id.
    pub fn id(&self) -> uuid::Uuid {
        self.id
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn state(&self) -> HandleState {
        match self.state.load(Ordering::SeqCst) {
            0 => HandleState::Running,
            1 => HandleState::Stopping,
            _ => HandleState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == HandleState::Running
    }

    fn set_state(&self, state: HandleState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

struct ManagedScheduler {
    handle: SchedulerHandle,
    join: JoinHandle<()>,
}

/// Owns creation, start, and shutdown of dispatch schedulers, one per
/// monitored destination.
pub struct SchedulerManager {
    store: Arc<dyn ScheduleStore>,
    channel: Arc<dyn NotificationChannel>,
    config: SchedulerConfig,
    schedulers: Mutex<HashMap<Destination, ManagedScheduler>>,
}

impl SchedulerManager {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        channel: Arc<dyn NotificationChannel>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            channel,
            config,
            schedulers: Mutex::new(HashMap::new()),
        }
    }

    /// Start a dispatch scheduler for `destination` unless one is already
    /// running, in which case the existing handle is returned unchanged.
    ///
    /// Returns as soon as the background task is spawned; no tick is awaited.
    pub async fn ensure_started(
        &self,
        user_id: &str,
        destination: &Destination,
    ) -> SchedulerHandle {
        let mut schedulers = self.schedulers.lock().await;
        if let Some(managed) = schedulers.get(destination) {
            debug!(destination = %destination, "scheduler already running");
            return managed.handle.clone();
        }

        let cancel = CancellationToken::new();
        let handle = SchedulerHandle::new(destination.clone(), cancel.clone());
        let scheduler = DispatchScheduler::new(
            Arc::clone(&self.store),
            Arc::clone(&self.channel),
            user_id,
            destination.clone(),
            self.config.max_attempts,
        );
        let poll_interval = Duration::from_secs(self.config.poll_interval_secs);
        let join = tokio::spawn(poll_loop(scheduler, poll_interval, cancel));

        info!(
            destination = %destination,
            user = user_id,
            interval_secs = self.config.poll_interval_secs,
            "dispatch scheduler started"
        );
        schedulers.insert(
            destination.clone(),
            ManagedScheduler {
                handle: handle.clone(),
                join,
            },
        );
        handle
    }

    /// Stop the scheduler generation behind `handle`.
    ///
    /// Signals cancellation, waits for an in-flight tick to complete, then
    /// releases the destination. No delivery attempt happens after this
    /// returns. Stopping a handle that is already past `Stopped` is an error.
    pub async fn stop(&self, handle: &SchedulerHandle) -> Result<(), DosewatchError> {
        if handle.state() == HandleState::Stopped {
            return Err(DosewatchError::SchedulerStopped {
                destination: handle.destination().to_string(),
            });
        }

        let managed = {
            let mut schedulers = self.schedulers.lock().await;
            let same_generation = schedulers
                .get(handle.destination())
                .is_some_and(|m| m.handle.id() == handle.id());
            if same_generation {
                schedulers.remove(handle.destination())
            } else {
                None
            }
        };

        let Some(managed) = managed else {
            // Lost a race with another stop of the same generation, or the
            // handle belongs to a superseded generation.
            return Err(DosewatchError::SchedulerStopped {
                destination: handle.destination().to_string(),
            });
        };

        managed.handle.set_state(HandleState::Stopping);
        managed.handle.cancel.cancel();
        if let Err(e) = managed.join.await {
            warn!(
                destination = %handle.destination(),
                error = %e,
                "scheduler task aborted uncleanly"
            );
        }
        managed.handle.set_state(HandleState::Stopped);
        info!(destination = %handle.destination(), "dispatch scheduler stopped");
        Ok(())
    }

    /// Stop every running scheduler, waiting for in-flight ticks.
    pub async fn stop_all(&self) {
        let handles: Vec<SchedulerHandle> = {
            let schedulers = self.schedulers.lock().await;
            schedulers.values().map(|m| m.handle.clone()).collect()
        };
        for handle in handles {
            if let Err(e) = self.stop(&handle).await {
                debug!(destination = %handle.destination(), error = %e, "already stopped");
            }
        }
    }

    pub async fn is_running(&self, destination: &Destination) -> bool {
        self.schedulers.lock().await.contains_key(destination)
    }

    pub async fn running_count(&self) -> usize {
        self.schedulers.lock().await.len()
    }
}

/// The per-destination polling loop.
///
/// Cancellation is cooperative: it is checked at the top of each tick and
/// raced against the inter-tick sleep, but never interrupts a tick in
/// flight, so a delivery attempt that already started always completes and
/// gets recorded.
async fn poll_loop(
    mut scheduler: DispatchScheduler,
    poll_interval: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if cancel.is_cancelled() {
                    break;
                }
                match scheduler.tick(Local::now().naive_local()).await {
                    Ok(report) if !report.is_empty() => {
                        info!(
                            delivered = report.delivered(),
                            failed = report.failed(),
                            skipped = report.skipped(),
                            "dispatch tick complete"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => {
                        // Store unreachable: drop this tick, retry at the
                        // next interval.
                        warn!(error = %e, "dispatch tick failed");
                    }
                }
            }
            _ = cancel.cancelled() => break,
        }
    }
    debug!("scheduler poll loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use dosewatch_core::DoseTime;
    use dosewatch_core::types::NewEntry;
    use dosewatch_test_utils::{open_temp_store, MockChannel};

    fn test_config(poll_interval_secs: u64) -> SchedulerConfig {
        SchedulerConfig {
            poll_interval_secs,
            max_attempts: 3,
            send_timeout_secs: 15,
        }
    }

    fn dest(n: u32) -> Destination {
        Destination(format!("whatsapp:+1555000{n:04}"))
    }

    async fn setup(
        poll_interval_secs: u64,
    ) -> (
        Arc<dosewatch_storage::SqliteScheduleStore>,
        Arc<MockChannel>,
        SchedulerManager,
        tempfile::TempDir,
    ) {
        let (store, dir) = open_temp_store().await;
        let channel = Arc::new(MockChannel::new());
        let manager = SchedulerManager::new(
            store.clone(),
            channel.clone(),
            test_config(poll_interval_secs),
        );
        (store, channel, manager, dir)
    }

    /// An entry due at the current wall-clock minute (and the next, so the
    /// test cannot race a minute boundary).
    fn entry_due_now(name: &str) -> NewEntry {
        let now = Local::now().naive_local();
        let next = now + chrono::Duration::minutes(1);
        NewEntry {
            name: name.to_string(),
            dosage: "500mg".to_string(),
            times: vec![DoseTime::from_time(now.time()), DoseTime::from_time(next.time())],
        }
    }

    #[tokio::test]
    async fn ensure_started_is_idempotent_per_destination() {
        let (_store, _channel, manager, _dir) = setup(60).await;

        let first = manager.ensure_started("u1", &dest(1)).await;
        let second = manager.ensure_started("u1", &dest(1)).await;
        assert_eq!(first.id(), second.id());
        assert_eq!(manager.running_count().await, 1);

        // A different destination gets its own scheduler.
        let other = manager.ensure_started("u2", &dest(2)).await;
        assert_ne!(first.id(), other.id());
        assert_eq!(manager.running_count().await, 2);

        manager.stop_all().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_prevents_all_future_attempts() {
        let (store, channel, manager, _dir) = setup(10).await;
        store
            .insert_entry("u1", &entry_due_now("Paracetamol"))
            .await
            .unwrap();

        let handle = manager.ensure_started("u1", &dest(1)).await;
        assert!(handle.is_running());

        // Cancel before the spawned task gets a chance to run its first tick.
        manager.stop(&handle).await.unwrap();
        assert_eq!(handle.state(), HandleState::Stopped);
        assert!(!manager.is_running(&dest(1)).await);

        // Advance the clock past several nominal firing intervals.
        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(10)).await;
        }
        assert_eq!(channel.sent_count().await, 0);
    }

    #[tokio::test]
    async fn double_stop_is_reported_not_ignored() {
        let (_store, _channel, manager, _dir) = setup(60).await;
        let handle = manager.ensure_started("u1", &dest(1)).await;

        manager.stop(&handle).await.unwrap();
        let err = manager.stop(&handle).await.unwrap_err();
        assert!(matches!(err, DosewatchError::SchedulerStopped { .. }));
    }

    #[tokio::test]
    async fn stopped_destination_restarts_as_fresh_generation() {
        let (_store, _channel, manager, _dir) = setup(60).await;

        let first = manager.ensure_started("u1", &dest(1)).await;
        manager.stop(&first).await.unwrap();
        assert_eq!(first.state(), HandleState::Stopped);

        let second = manager.ensure_started("u1", &dest(1)).await;
        assert_ne!(first.id(), second.id());
        assert!(second.is_running());
        // The old generation's handle stays stopped.
        assert_eq!(first.state(), HandleState::Stopped);

        manager.stop_all().await;
    }

    #[tokio::test]
    async fn stale_generation_handle_cannot_stop_the_new_one() {
        let (_store, _channel, manager, _dir) = setup(60).await;

        let first = manager.ensure_started("u1", &dest(1)).await;
        manager.stop(&first).await.unwrap();
        let second = manager.ensure_started("u1", &dest(1)).await;

        // The stale handle errors and the new generation keeps running.
        assert!(manager.stop(&first).await.is_err());
        assert!(manager.is_running(&dest(1)).await);

        manager.stop(&second).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn live_loop_delivers_then_stop_silences() {
        let (store, channel, manager, _dir) = setup(1).await;
        store
            .insert_entry("u1", &entry_due_now("Paracetamol"))
            .await
            .unwrap();

        let handle = manager.ensure_started("u1", &dest(1)).await;

        // The first interval tick fires immediately; wait for the delivery.
        let mut waited = 0;
        while channel.sent_count().await == 0 && waited < 200 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            waited += 1;
        }
        assert!(channel.sent_count().await >= 1, "first tick should deliver");

        manager.stop(&handle).await.unwrap();
        let after_stop = channel.sent_count().await;
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(channel.sent_count().await, after_stop);
    }

    #[tokio::test]
    async fn stop_all_drains_every_destination() {
        let (_store, _channel, manager, _dir) = setup(60).await;
        manager.ensure_started("u1", &dest(1)).await;
        manager.ensure_started("u2", &dest(2)).await;
        manager.ensure_started("u3", &dest(3)).await;
        assert_eq!(manager.running_count().await, 3);

        manager.stop_all().await;
        assert_eq!(manager.running_count().await, 0);
    }
}
