// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pawsteps API Server
//!
//! Turns daily steps into virtual pets and furniture: reconciles step
//! counts from device and health-service sources, tracks goal streaks,
//! and issues rewards behind race-safe eligibility checks.

use pawsteps::{
    config::Config,
    db::FirestoreDb,
    services::{HealthClient, ProgressTracker, RewardService, StepCounterService, StreakEngine},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Pawsteps API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Initialize the health-service client
    let health = HealthClient::new(&config).expect("Failed to initialize health client");
    tracing::info!(
        base_url = %config.health_api_base_url,
        "Health service client initialized"
    );

    // Build the engine: step counter, progress tracker, streaks, rewards
    let counter = StepCounterService::new(db.clone(), health, &config);
    let progress = ProgressTracker::new(db.clone());
    let streaks = StreakEngine::new(db.clone());
    let rewards = RewardService::new(db.clone(), streaks.clone());

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        counter,
        progress,
        streaks,
        rewards,
    });

    // Build router
    let app = pawsteps::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pawsteps=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
