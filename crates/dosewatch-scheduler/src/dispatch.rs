// SPDX-FileCopyrightText: 2026 Dosewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatch scheduler: one tick scans for due occurrences and attempts
//! exactly one delivery per occurrence.
//!
//! The clock is injected into [`DispatchScheduler::tick`] so tests drive a
//! simulated day; the poll loop in [`crate::manager`] supplies wall-clock
//! local time. Dedup is anchored in the delivery log, not in-process state,
//! so it holds across restarts and racing scheduler generations.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use dosewatch_core::types::{
    DeliveryOutcome, Dispatch, DispatchAction, DispatchReport, DueDose, EntryStatus,
};
use dosewatch_core::{
    Destination, DosewatchError, DoseTime, FailureKind, NotificationChannel, ScheduleStore,
};

use crate::window::TickWindow;

/// Periodically invoked dispatcher for one (user, destination) pair.
pub struct DispatchScheduler {
    store: Arc<dyn ScheduleStore>,
    channel: Arc<dyn NotificationChannel>,
    user_id: String,
    destination: Destination,
    max_attempts: u32,
    last_tick: Option<NaiveDateTime>,
}

impl DispatchScheduler {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        channel: Arc<dyn NotificationChannel>,
        user_id: impl Into<String>,
        destination: Destination,
        max_attempts: u32,
    ) -> Self {
        Self {
            store,
            channel,
            user_id: user_id.into(),
            destination,
            max_attempts,
            last_tick: None,
        }
    }

    /// Run one dispatch pass at the injected time.
    ///
    /// Queries the store for occurrences due in this tick's window plus
    /// same-day transient failures still under the attempt cap, and attempts
    /// one delivery per occurrence in ascending (name, slot) order. Per-entry
    /// failures are isolated into the report; only failure of the due queries
    /// themselves aborts the tick.
    pub async fn tick(&mut self, now: NaiveDateTime) -> Result<DispatchReport, DosewatchError> {
        let window = match self.last_tick {
            Some(prev) => TickWindow::between(prev, now),
            None => TickWindow::first(now),
        };
        self.last_tick = Some(now);

        let mut window_due: Vec<DueDose> = Vec::new();
        for segment in window.segments() {
            window_due.extend(
                self.store
                    .list_due(&self.user_id, segment.date, segment.from, segment.to)
                    .await?,
            );
        }

        let mut report = DispatchReport::default();
        let mut due: Vec<DueDose> = Vec::new();
        for dose in window_due {
            if dose.prior_attempts == 0 {
                due.push(dose);
                continue;
            }
            // A restarted scheduler re-covers the current minute. An already
            // delivered occurrence surfaces as a duplicate skip; failed ones
            // are left to the retry path below so the attempt cap holds and
            // permanent failures stay dead.
            if self
                .store
                .has_delivery(dose.entry_id, dose.occurred_on, dose.slot)
                .await?
            {
                debug!(entry = %dose.entry_id, slot = %dose.slot, "occurrence already delivered");
                report.dispatches.push(Dispatch {
                    entry_id: dose.entry_id,
                    name: dose.name,
                    slot: dose.slot,
                    occurred_on: dose.occurred_on,
                    action: DispatchAction::SkippedDuplicate,
                });
            }
        }

        // Occurrences that failed transiently earlier today get one attempt
        // per tick until the cap; never across a calendar day. Disjoint from
        // the fresh set above, which has zero prior attempts.
        due.extend(
            self.store
                .list_retryable(&self.user_id, now.date(), self.max_attempts)
                .await?,
        );

        for dose in due {
            let action = match self.dispatch_one(&dose).await {
                Ok(action) => action,
                Err(e) => {
                    // Bookkeeping failed for this entry; keep going with the rest.
                    warn!(
                        entry = %dose.entry_id,
                        slot = %dose.slot,
                        error = %e,
                        "dispatch bookkeeping failed"
                    );
                    DispatchAction::Failed {
                        kind: FailureKind::Transient,
                        error: e.to_string(),
                    }
                }
            };
            report.dispatches.push(Dispatch {
                entry_id: dose.entry_id,
                name: dose.name,
                slot: dose.slot,
                occurred_on: dose.occurred_on,
                action,
            });
        }
        Ok(report)
    }

    async fn dispatch_one(&self, dose: &DueDose) -> Result<DispatchAction, DosewatchError> {
        if self
            .store
            .has_delivery(dose.entry_id, dose.occurred_on, dose.slot)
            .await?
        {
            debug!(entry = %dose.entry_id, slot = %dose.slot, "occurrence already delivered");
            return Ok(DispatchAction::SkippedDuplicate);
        }

        // Re-validate right before delivery: the entry may have been deleted
        // or cancelled since the due query.
        if !self.store.entry_deliverable(dose.entry_id).await? {
            debug!(entry = %dose.entry_id, slot = %dose.slot, "entry gone before delivery");
            return Ok(DispatchAction::SkippedMissing);
        }

        let body = format_reminder(&dose.name, &dose.dosage, dose.slot);
        match self.channel.send(&self.destination, &body).await {
            Ok(message_id) => {
                self.store
                    .record_delivery(
                        dose.entry_id,
                        dose.occurred_on,
                        dose.slot,
                        DeliveryOutcome::Delivered,
                    )
                    .await?;
                self.store
                    .set_status(dose.entry_id, EntryStatus::Delivered)
                    .await?;
                info!(
                    entry = %dose.entry_id,
                    name = %dose.name,
                    slot = %dose.slot,
                    "reminder delivered"
                );
                Ok(DispatchAction::Delivered { message_id })
            }
            Err(failure) => {
                let attempt = self
                    .store
                    .record_delivery(
                        dose.entry_id,
                        dose.occurred_on,
                        dose.slot,
                        DeliveryOutcome::from(failure.kind),
                    )
                    .await?;
                warn!(
                    entry = %dose.entry_id,
                    slot = %dose.slot,
                    attempt,
                    kind = %failure.kind,
                    error = %failure.message,
                    "reminder delivery failed"
                );
                Ok(DispatchAction::Failed {
                    kind: failure.kind,
                    error: failure.message,
                })
            }
        }
    }
}

/// The WhatsApp reminder body.
pub fn format_reminder(name: &str, dosage: &str, slot: DoseTime) -> String {
    format!(
        "🚨 *Dosewatch* 🚨\n\nTIME TO TAKE YOUR MEDICINE!\n\n\
         💊 Medication: {name}\n📏 Dosage: {dosage}\n⏰ Time: {slot}\n\nStay healthy! 💪"
    )
}
