// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These require the Firestore emulator (FIRESTORE_EMULATOR_HOST) and
//! are skipped otherwise.

use chrono::NaiveDate;
use pawsteps::db::FirestoreDb;
use pawsteps::models::{DailySteps, GoalCompletion, Profile, StepSnapshot};
use pawsteps::time_utils::now_rfc3339;

mod common;

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

async fn seed_profile(db: &FirestoreDb, user_id: &str) -> Profile {
    let profile = Profile::new_default(user_id, &now_rfc3339());
    db.upsert_profile(&profile).await.expect("profile upsert");
    profile
}

fn completion(user_id: &str, date: &str, goal_met: bool) -> GoalCompletion {
    GoalCompletion {
        user_id: user_id.to_string(),
        completion_date: date.to_string(),
        steps_achieved: if goal_met { 12_000 } else { 3_000 },
        goal_steps: 10_000,
        goal_met,
    }
}

#[tokio::test]
async fn test_daily_steps_upsert_is_idempotent() {
    require_emulator!();
    let db = common::test_db().await;
    let user_id = "it-daily-steps-1";

    // N upserts for the same (user, date) leave exactly one row with
    // the last call's values.
    for steps in [100u64, 2_500, 10_100] {
        let row = DailySteps {
            user_id: user_id.to_string(),
            date: "2024-01-15".to_string(),
            step_count: steps,
            goal_reached: steps >= 10_000,
            updated_at: now_rfc3339(),
        };
        db.upsert_daily_steps(&row).await.expect("upsert");
    }

    let stored = db
        .get_daily_steps(user_id, "2024-01-15")
        .await
        .expect("get")
        .expect("row must exist");

    assert_eq!(stored.step_count, 10_100);
    assert!(stored.goal_reached);
}

#[tokio::test]
async fn test_goal_completion_upsert_is_idempotent() {
    require_emulator!();
    let db = common::test_db().await;
    let user_id = "it-completions-1";

    db.upsert_goal_completion(&completion(user_id, "2024-01-15", false))
        .await
        .expect("upsert");
    db.upsert_goal_completion(&completion(user_id, "2024-01-15", true))
        .await
        .expect("upsert");

    let rows = db
        .get_completions_after(user_id, None)
        .await
        .expect("query");

    assert_eq!(rows.len(), 1);
    assert!(rows[0].goal_met);
}

#[tokio::test]
async fn test_completions_after_anchor_excludes_older_rows() {
    require_emulator!();
    let db = common::test_db().await;
    let user_id = "it-completions-2";

    for date in ["2024-01-01", "2024-01-02", "2024-01-03", "2024-01-04"] {
        db.upsert_goal_completion(&completion(user_id, date, true))
            .await
            .expect("upsert");
    }

    let rows = db
        .get_completions_after(user_id, Some("2024-01-02"))
        .await
        .expect("query");

    let dates: Vec<&str> = rows.iter().map(|r| r.completion_date.as_str()).collect();
    assert_eq!(dates, vec!["2024-01-04", "2024-01-03"]);
}

#[tokio::test]
async fn test_step_snapshot_roundtrip() {
    require_emulator!();
    let db = common::test_db().await;
    let user_id = "it-snapshot-1";

    let snapshot = StepSnapshot {
        user_id: user_id.to_string(),
        date: "2024-01-15".to_string(),
        steps: 4_321,
        health_at_save: 4_500,
        session_last: 4_321,
        saved_at: now_rfc3339(),
    };
    db.set_step_snapshot(&snapshot).await.expect("set");

    let stored = db
        .get_step_snapshot(user_id)
        .await
        .expect("get")
        .expect("snapshot must exist");

    assert_eq!(stored.steps, 4_321);
    assert_eq!(stored.health_at_save, 4_500);
    assert_eq!(stored.session_last, 4_321);
}

#[tokio::test]
async fn test_counter_restores_snapshot_after_restart() {
    require_emulator!();
    let db = common::test_db().await;
    let user_id = "it-restore-1";
    let today = day("2024-01-15");

    let snapshot = StepSnapshot {
        user_id: user_id.to_string(),
        date: "2024-01-15".to_string(),
        steps: 6_000,
        health_at_save: 6_100,
        session_last: 6_000,
        saved_at: now_rfc3339(),
    };
    db.set_step_snapshot(&snapshot).await.expect("set");

    // A fresh service instance (new process) restores today's snapshot,
    // and an already-applied session sample is not applied again.
    let (_, state) = common::create_test_app_with_db(db);
    let restored = state
        .counter
        .record_device_sample(user_id, today, 6_000)
        .await;

    assert_eq!(restored, 6_000);
}

#[tokio::test]
async fn test_user_data_deletion_removes_everything() {
    require_emulator!();
    let db = common::test_db().await;
    let user_id = "it-delete-1";

    seed_profile(&db, user_id).await;
    db.upsert_goal_completion(&completion(user_id, "2024-01-15", true))
        .await
        .expect("completion");
    db.upsert_daily_steps(&DailySteps {
        user_id: user_id.to_string(),
        date: "2024-01-15".to_string(),
        step_count: 11_000,
        goal_reached: true,
        updated_at: now_rfc3339(),
    })
    .await
    .expect("daily");

    let deleted = db.delete_user_data(user_id).await.expect("delete");
    assert!(deleted >= 4); // completion + daily + snapshot slot + profile slot

    assert!(db.get_profile(user_id).await.expect("get").is_none());
    assert!(db
        .get_goal_completion(user_id, "2024-01-15")
        .await
        .expect("get")
        .is_none());
    assert!(db
        .get_daily_steps(user_id, "2024-01-15")
        .await
        .expect("get")
        .is_none());
}
