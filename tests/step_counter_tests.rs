// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Step source adapter behavior tests.
//!
//! These run against the offline mock database (snapshot persistence
//! failures are transient by design) and the mock health client, so
//! every counting and reconciliation rule is exercised without an
//! emulator.

use chrono::NaiveDate;
use pawsteps::config::Config;
use pawsteps::db::FirestoreDb;
use pawsteps::models::StepSource;
use pawsteps::services::{HealthClient, StepCounterService};

fn service() -> (StepCounterService, HealthClient) {
    let config = Config::test_default();
    let health = HealthClient::new_mock();
    let counter = StepCounterService::new(FirestoreDb::new_mock(), health.clone(), &config);
    (counter, health)
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_monotonic_deltas_from_cumulative_samples() {
    let (counter, _) = service();
    let today = day("2024-01-15");

    assert_eq!(counter.record_device_sample("u1", today, 10).await, 10);
    assert_eq!(counter.record_device_sample("u1", today, 25).await, 25);
    assert_eq!(counter.record_device_sample("u1", today, 40).await, 40);
}

#[tokio::test]
async fn test_retransmitted_sample_is_not_double_counted() {
    let (counter, _) = service();
    let today = day("2024-01-15");

    counter.record_device_sample("u1", today, 25).await;
    assert_eq!(counter.record_device_sample("u1", today, 25).await, 25);
}

#[tokio::test]
async fn test_session_restart_becomes_fresh_base() {
    let (counter, _) = service();
    let today = day("2024-01-15");

    counter.record_device_sample("u1", today, 100).await;
    // A lower cumulative value means the device subscription restarted;
    // the new sample counts in full, nothing is lost or re-applied.
    assert_eq!(counter.record_device_sample("u1", today, 30).await, 130);
}

#[tokio::test]
async fn test_reconciliation_adds_exactly_the_health_delta() {
    let (counter, health) = service();
    let today = day("2024-01-15");

    // First sync establishes the health baseline (H1) without adding.
    health.set_mock_reading("u1", 500);
    assert_eq!(counter.sync_with_health("u1", today, 0).await, 0);

    // Local accumulation while foregrounded.
    counter.record_device_sample("u1", today, 200).await;

    // Health grew to H2 while the local counter could not run.
    health.set_mock_reading("u1", 800);
    let reconciled = counter.sync_with_health("u1", today, 0).await;

    // L + (H2 - H1), not L + H2.
    assert_eq!(reconciled, 200 + (800 - 500));
}

#[tokio::test]
async fn test_first_sync_never_adds_absolute_reading() {
    let (counter, health) = service();
    let today = day("2024-01-15");

    counter.record_device_sample("u1", today, 50).await;

    // No baseline yet: a large absolute reading must not be added.
    health.set_mock_reading("u1", 9_000);
    assert_eq!(counter.sync_with_health("u1", today, 0).await, 50);
}

#[tokio::test]
async fn test_health_failure_means_no_update() {
    let (counter, health) = service();
    let today = day("2024-01-15");

    counter.record_device_sample("u1", today, 120).await;

    // No mock reading set: the health call fails; the previous value is
    // retained and nothing is surfaced as fatal.
    health.clear_mock_reading("u1");
    assert_eq!(counter.sync_with_health("u1", today, 0).await, 120);
}

#[tokio::test]
async fn test_flush_then_sync_reconciles_background_steps() {
    let (counter, health) = service();
    let today = day("2024-01-15");

    counter.record_device_sample("u1", today, 300).await;

    // Backgrounding captures the health reading with the count.
    health.set_mock_reading("u1", 1_000);
    assert_eq!(counter.flush("u1", today).await, 300);

    // Steps taken while backgrounded show up in the health service.
    health.set_mock_reading("u1", 1_250);
    assert_eq!(counter.sync_with_health("u1", today, 0).await, 300 + 250);
}

#[tokio::test]
async fn test_day_boundary_resets_counter() {
    let (counter, health) = service();

    counter.record_device_sample("u1", day("2024-01-15"), 5_000).await;
    health.set_mock_reading("u1", 5_000);
    counter.sync_with_health("u1", day("2024-01-15"), 0).await;

    // Crossing midnight: prior-date counts never carry over.
    let next_day = day("2024-01-16");
    assert_eq!(
        counter.current("u1", next_day, StepSource::Pedometer).await,
        0
    );

    // And the stale health baseline is gone too: the new day's first
    // sync only establishes a fresh baseline.
    health.set_mock_reading("u1", 400);
    assert_eq!(counter.sync_with_health("u1", next_day, 0).await, 0);
}

#[tokio::test]
async fn test_health_source_reads_health_counter() {
    let (counter, health) = service();
    let today = day("2024-01-15");

    health.set_mock_reading("u1", 777);
    counter.sync_with_health("u1", today, 0).await;

    assert_eq!(
        counter
            .current("u1", today, StepSource::HealthIntegration)
            .await,
        777
    );
    assert_eq!(counter.current("u1", today, StepSource::Pedometer).await, 0);
}

#[tokio::test]
async fn test_counters_are_per_user() {
    let (counter, _) = service();
    let today = day("2024-01-15");

    counter.record_device_sample("u1", today, 100).await;
    counter.record_device_sample("u2", today, 7).await;

    assert_eq!(counter.current("u1", today, StepSource::Pedometer).await, 100);
    assert_eq!(counter.current("u2", today, StepSource::Pedometer).await, 7);
}

#[tokio::test]
async fn test_concurrent_samples_serialize_per_user() {
    let (counter, _) = service();
    let today = day("2024-01-15");

    // The same cumulative sample delivered by several concurrent
    // callers (UI re-render plus background refresh): the per-user
    // mutex serializes the writes and the delta rule makes the
    // duplicates no-ops, whatever order they land in.
    let mut handles = Vec::new();
    for _ in 0..5 {
        let counter = counter.clone();
        handles.push(tokio::spawn(async move {
            counter.record_device_sample("u1", today, 50).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(counter.current("u1", today, StepSource::Pedometer).await, 50);
}
