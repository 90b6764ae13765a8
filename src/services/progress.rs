// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily progress tracking.
//!
//! Converts `(steps, goal)` into a capped percentage and persists the
//! day's result: one `daily_steps` row and one `goal_completions` row
//! per (user, date), both upserted in place as steps increase. The
//! reward engine reads `goal_completions`; this tracker does not itself
//! gate rewards.

use chrono::NaiveDate;

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{DailySteps, GoalCompletion};
use crate::time_utils::{date_key, now_rfc3339};

/// Progress percentage, capped at 100. A zero goal reports 0 rather
/// than dividing by zero.
pub fn progress_percent(steps: u64, goal: u32) -> u8 {
    if goal == 0 {
        return 0;
    }
    let goal = goal as u64;
    (((100 * steps) + goal / 2) / goal).min(100) as u8
}

/// Outcome of a progress recalculation.
#[derive(Debug, Clone)]
pub struct ProgressOutcome {
    pub date: String,
    pub steps: u64,
    pub goal: u32,
    pub percent: u8,
    pub goal_met: bool,
}

/// Daily progress tracker.
#[derive(Clone)]
pub struct ProgressTracker {
    db: FirestoreDb,
}

impl ProgressTracker {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Evaluate progress for today and upsert the day's rows.
    ///
    /// Safe to call every time steps increase: the `(user, date)` keyed
    /// documents are overwritten, never duplicated.
    pub async fn record(
        &self,
        user_id: &str,
        today: NaiveDate,
        steps: u64,
        goal: u32,
    ) -> Result<ProgressOutcome> {
        let date = date_key(today);
        let goal_met = goal > 0 && steps >= goal as u64;

        let daily = DailySteps {
            user_id: user_id.to_string(),
            date: date.clone(),
            step_count: steps,
            goal_reached: goal_met,
            updated_at: now_rfc3339(),
        };
        self.db.upsert_daily_steps(&daily).await?;

        let completion = GoalCompletion {
            user_id: user_id.to_string(),
            completion_date: date.clone(),
            steps_achieved: steps,
            goal_steps: goal,
            goal_met,
        };
        self.db.upsert_goal_completion(&completion).await?;

        Ok(ProgressOutcome {
            date,
            steps,
            goal,
            percent: progress_percent(steps, goal),
            goal_met,
        })
    }
}
