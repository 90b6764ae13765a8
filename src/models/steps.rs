// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Step count models for storage and API.

use serde::{Deserialize, Serialize};

/// Daily step row, unique per (user, date) by document id `{user}_{date}`.
///
/// Updated in place as steps increase; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySteps {
    pub user_id: String,
    /// Calendar date in the user's timezone (`YYYY-MM-DD`)
    pub date: String,
    pub step_count: u64,
    pub goal_reached: bool,
    pub updated_at: String,
}

/// Durable snapshot of the step adapter's counter state, one per user.
///
/// `health_at_save` is the health-service reading captured with the
/// count, so missed-step reconciliation always computes its delta
/// against a known-consistent pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub user_id: String,
    /// The day the counter covers (`YYYY-MM-DD`)
    pub date: String,
    /// Accumulated pedometer steps for that day
    pub steps: u64,
    /// Health-service reading observed when this snapshot was saved
    #[serde(default)]
    pub health_at_save: u64,
    /// Last cumulative device-session sample already applied to `steps`
    #[serde(default)]
    pub session_last: u64,
    pub saved_at: String,
}
