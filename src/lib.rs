// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Pawsteps: turn daily steps into virtual pets and furniture
//!
//! This crate provides the backend API for the Pawsteps habit tracker:
//! it reconciles step counts from device and health-service sources,
//! tracks daily goal completions and streaks, and issues rewards behind
//! idempotent, race-safe eligibility checks.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{ProgressTracker, RewardService, StepCounterService, StreakEngine};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub counter: StepCounterService,
    pub progress: ProgressTracker,
    pub streaks: StreakEngine,
    pub rewards: RewardService,
}
