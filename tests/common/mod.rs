// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use pawsteps::config::Config;
use pawsteps::db::FirestoreDb;
use pawsteps::routes::create_router;
use pawsteps::services::{
    HealthClient, ProgressTracker, RewardService, StepCounterService, StreakEngine,
};
use pawsteps::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a test app with the given database and a mock health client.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app_with_db(db: FirestoreDb) -> (axum::Router, Arc<AppState>) {
    let config = Config::test_default();
    let health = HealthClient::new_mock();

    let counter = StepCounterService::new(db.clone(), health, &config);
    let progress = ProgressTracker::new(db.clone());
    let streaks = StreakEngine::new(db.clone());
    let rewards = RewardService::new(db.clone(), streaks.clone());

    let state = Arc::new(AppState {
        config,
        db,
        counter,
        progress,
        streaks,
        rewards,
    });

    (create_router(state.clone()), state)
}

/// Create a test app with offline mock dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(test_db_offline())
}
