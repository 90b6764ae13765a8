// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The step source adapter: one authoritative step counter per user.
//!
//! Clients stream cumulative pedometer samples and app-lifecycle events
//! at this service; the platform health service is read for
//! reconciliation. The counter registry is process-wide singleton state:
//! every observer of a user's count reads the same instance, and all
//! mutation is serialized through a per-user async mutex, so listener
//! callbacks and in-flight persists cannot interleave updates.
//!
//! Key algorithm, missed-step reconciliation: the pedometer only
//! accumulates while the app is alive. Each snapshot saves the
//! health-service reading alongside the count, and on foreground the
//! adapter adds exactly `max(0, health_now - health_at_save)` to the
//! restored count. Deltas are computed only against that
//! known-consistent pair, never against an absolute health reading.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{Profile, StepSnapshot, StepSource};
use crate::services::HealthClient;
use crate::time_utils::{date_key, now_rfc3339, parse_date_key, today_for_offset};

/// In-memory counter state for one user. All fields are read and
/// written only under the per-user mutex.
struct CounterState {
    /// The day this counter covers (user-local)
    date: NaiveDate,
    /// Pedometer steps accumulated for `date`
    device_steps: u64,
    /// Last cumulative sample seen from the device session
    session_last: u64,
    /// Latest health-service reading for `date`
    health_steps: u64,
    /// Health-service reading captured at the last snapshot save
    last_health_sync: u64,
    /// Whether the durable snapshot restore has been attempted
    restored: bool,
    /// Pending debounced persist, if any
    pending_persist: Option<JoinHandle<()>>,
    /// Foreground health poll task, if running
    poller: Option<JoinHandle<()>>,
}

impl CounterState {
    fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            device_steps: 0,
            session_last: 0,
            health_steps: 0,
            last_health_sync: 0,
            restored: false,
            pending_persist: None,
            poller: None,
        }
    }
}

struct Inner {
    db: FirestoreDb,
    health: HealthClient,
    counters: DashMap<String, Arc<Mutex<CounterState>>>,
    debounce: Duration,
    poll_interval: Duration,
}

/// Step counter service (the step source adapter).
#[derive(Clone)]
pub struct StepCounterService {
    inner: Arc<Inner>,
}

impl StepCounterService {
    pub fn new(db: FirestoreDb, health: HealthClient, config: &Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                db,
                health,
                counters: DashMap::new(),
                debounce: Duration::from_millis(config.persist_debounce_ms),
                poll_interval: Duration::from_millis(config.health_poll_interval_ms),
            }),
        }
    }

    /// The singleton counter cell for a user.
    fn cell(&self, user_id: &str, today: NaiveDate) -> Arc<Mutex<CounterState>> {
        self.inner
            .counters
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CounterState::new(today))))
            .clone()
    }

    /// Apply a cumulative pedometer sample from the device session.
    ///
    /// Samples are cumulative since the device subscription started; the
    /// applied delta is the increase over the previous sample, so a
    /// sample is never double-counted even when it is retransmitted. A
    /// lower value than the previous sample means the subscription
    /// restarted, and the sample is a fresh session base.
    ///
    /// Returns the updated pedometer count for today.
    pub async fn record_device_sample(
        &self,
        user_id: &str,
        today: NaiveDate,
        session_cumulative: u64,
    ) -> u64 {
        let cell = self.cell(user_id, today);
        let mut state = cell.lock().await;
        prepare(&self.inner, user_id, today, &mut state).await;

        let delta = if session_cumulative >= state.session_last {
            session_cumulative - state.session_last
        } else {
            session_cumulative
        };
        state.session_last = session_cumulative;

        if delta > 0 {
            state.device_steps += delta;
            tracing::debug!(
                user_id,
                delta,
                total = state.device_steps,
                "Pedometer steps applied"
            );
            self.schedule_persist(user_id, &cell, &mut state);
        }

        state.device_steps
    }

    /// Best-known count for today for the given source.
    pub async fn current(&self, user_id: &str, today: NaiveDate, source: StepSource) -> u64 {
        let cell = self.cell(user_id, today);
        let mut state = cell.lock().await;
        prepare(&self.inner, user_id, today, &mut state).await;

        match source {
            StepSource::Pedometer => state.device_steps,
            StepSource::HealthIntegration => state.health_steps,
        }
    }

    /// Foreground/refresh: reconcile missed steps against the health
    /// service, persist the new consistent pair, and start the
    /// foreground poll task.
    ///
    /// Returns the updated pedometer count for today.
    pub async fn sync_with_health(
        &self,
        user_id: &str,
        today: NaiveDate,
        tz_offset_minutes: i32,
    ) -> u64 {
        let cell = self.cell(user_id, today);
        let mut state = cell.lock().await;
        prepare(&self.inner, user_id, today, &mut state).await;

        match self.inner.health.steps_since_midnight(user_id, today).await {
            Ok(health_now) => {
                state.health_steps = health_now;

                // Only a prior sync establishes a baseline; without one
                // the delta cannot be attributed to missed local steps.
                let missed = health_now.saturating_sub(state.last_health_sync);
                if state.last_health_sync > 0 && missed > 0 {
                    state.device_steps += missed;
                    tracing::info!(
                        user_id,
                        missed,
                        total = state.device_steps,
                        "Reconciled missed steps from health service"
                    );
                }
                state.last_health_sync = health_now;

                persist_now(&self.inner, user_id, &state).await;
            }
            Err(e) => {
                tracing::debug!(user_id, error = %e, "Health read failed; keeping previous value");
            }
        }

        self.start_poller(user_id, tz_offset_minutes, &cell, &mut state);

        state.device_steps
    }

    /// Background transition: cancel any pending debounced persist,
    /// capture the health reading for the next reconciliation, and flush
    /// the snapshot synchronously. The last value before backgrounding
    /// is never dropped by the debounce.
    ///
    /// Returns the flushed pedometer count.
    pub async fn flush(&self, user_id: &str, today: NaiveDate) -> u64 {
        let cell = self.cell(user_id, today);
        let mut state = cell.lock().await;
        prepare(&self.inner, user_id, today, &mut state).await;

        if let Some(handle) = state.pending_persist.take() {
            handle.abort();
        }
        stop_poller(&mut state);

        match self.inner.health.steps_since_midnight(user_id, today).await {
            Ok(health_now) => {
                state.health_steps = health_now;
                state.last_health_sync = health_now;
            }
            Err(e) => {
                tracing::debug!(user_id, error = %e, "Health read at background failed; snapshot keeps last sync");
            }
        }

        persist_now(&self.inner, user_id, &state).await;

        tracing::debug!(
            user_id,
            steps = state.device_steps,
            "Step snapshot flushed on background"
        );

        state.device_steps
    }

    /// Switch the user's selected source. Both sources keep tracking, so
    /// the switch is instantaneous and lossless.
    pub async fn switch_source(&self, profile: &mut Profile, new_source: StepSource) -> Result<()> {
        profile.step_source = new_source;
        profile.updated_at = now_rfc3339();
        self.inner.db.upsert_profile(profile).await?;
        tracing::info!(user_id = %profile.id, source = ?new_source, "Step source switched");
        Ok(())
    }

    /// (Re)arm the debounced snapshot persist for a user.
    fn schedule_persist(
        &self,
        user_id: &str,
        cell: &Arc<Mutex<CounterState>>,
        state: &mut CounterState,
    ) {
        if let Some(handle) = state.pending_persist.take() {
            handle.abort();
        }

        let inner = self.inner.clone();
        let user_id = user_id.to_string();
        let cell = cell.clone();

        state.pending_persist = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.debounce).await;
            let snapshot = {
                let mut guard = cell.lock().await;
                guard.pending_persist = None;
                snapshot_of(&user_id, &guard)
            };
            persist_snapshot(&inner, &snapshot).await;
        }));
    }

    /// Start the ~1s health poll task for a foregrounded user.
    fn start_poller(
        &self,
        user_id: &str,
        tz_offset_minutes: i32,
        cell: &Arc<Mutex<CounterState>>,
        state: &mut CounterState,
    ) {
        if state.poller.is_some() {
            return;
        }

        let inner = self.inner.clone();
        let user_id = user_id.to_string();
        let cell = cell.clone();

        state.poller = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(inner.poll_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick fires immediately; the sync that started us
            // just read the service, so skip it.
            interval.tick().await;

            loop {
                interval.tick().await;
                let today = today_for_offset(tz_offset_minutes);
                match inner.health.steps_since_midnight(&user_id, today).await {
                    Ok(health_now) => {
                        let mut state = cell.lock().await;
                        // Day rollover is handled by the next explicit
                        // operation; a poll never resets the counter.
                        if state.date == today {
                            state.health_steps = health_now;
                        }
                    }
                    Err(e) => {
                        tracing::trace!(user_id = %user_id, error = %e, "Health poll failed");
                    }
                }
            }
        }));
    }
}

/// Roll the counter over a day boundary and restore the durable
/// snapshot on first touch.
async fn prepare(inner: &Inner, user_id: &str, today: NaiveDate, state: &mut CounterState) {
    if state.date != today {
        tracing::info!(
            user_id,
            previous = %state.date,
            today = %today,
            "Day boundary: resetting step counter"
        );
        state.date = today;
        state.device_steps = 0;
        state.health_steps = 0;
        state.last_health_sync = 0;
        // session_last survives: the device session's cumulative stream
        // spans midnight.
    }

    if !state.restored {
        state.restored = true;
        match inner.db.get_step_snapshot(user_id).await {
            Ok(Some(snapshot)) if parse_date_key(&snapshot.date) == Some(today) => {
                state.device_steps = snapshot.steps;
                state.last_health_sync = snapshot.health_at_save;
                // Restore the session cursor too, so samples already
                // applied before a restart are not applied again.
                state.session_last = state.session_last.max(snapshot.session_last);
                tracing::info!(
                    user_id,
                    steps = snapshot.steps,
                    "Restored step snapshot for today"
                );
            }
            Ok(_) => {
                // No snapshot, or one from a prior date: no carryover.
                persist_now(inner, user_id, state).await;
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Snapshot restore failed; starting from 0");
            }
        }
    }
}

fn stop_poller(state: &mut CounterState) {
    if let Some(handle) = state.poller.take() {
        handle.abort();
    }
}

fn snapshot_of(user_id: &str, state: &CounterState) -> StepSnapshot {
    StepSnapshot {
        user_id: user_id.to_string(),
        date: date_key(state.date),
        steps: state.device_steps,
        health_at_save: state.last_health_sync,
        session_last: state.session_last,
        saved_at: now_rfc3339(),
    }
}

/// Persist the snapshot while holding the counter lock.
async fn persist_now(inner: &Inner, user_id: &str, state: &CounterState) {
    persist_snapshot(inner, &snapshot_of(user_id, state)).await;
}

async fn persist_snapshot(inner: &Inner, snapshot: &StepSnapshot) {
    if let Err(e) = inner.db.set_step_snapshot(snapshot).await {
        // Transient: the previous durable value is retained and the next
        // trigger retries.
        tracing::warn!(user_id = %snapshot.user_id, error = %e, "Step snapshot persist failed");
    }
}
