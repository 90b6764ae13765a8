// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Goal completion model, the source of truth for streaks.

use serde::{Deserialize, Serialize};

/// One row per (user, day), document id `{user}_{date}`.
///
/// Shared by the pet and furniture subsystems; upserted on every
/// progress recalculation, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalCompletion {
    pub user_id: String,
    /// Calendar date in the user's timezone (`YYYY-MM-DD`)
    pub completion_date: String,
    pub steps_achieved: u64,
    pub goal_steps: u32,
    pub goal_met: bool,
}
