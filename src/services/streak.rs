// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Streak accounting.
//!
//! A streak is the number of consecutive calendar days with a goal-met
//! completion, unbroken by a missed or failed day, counted over the
//! completions strictly after the most recent reward-of-kind's award
//! date. It is always recomputed from the `goal_completions` rows and
//! never read from a stored counter, so partial updates cannot make it
//! drift. `profiles.current_streak` is a display cache only.

use chrono::NaiveDate;

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{GoalCompletion, RewardKind};
use crate::time_utils::{date_part, parse_date_key};

/// Walk completions (sorted descending by date) backward from `today`
/// and count the trailing run of consecutive goal-met days.
///
/// If today's completion is not yet recorded, the walk starts at
/// yesterday: an unbroken run through yesterday still counts. A gap or
/// a goal-not-met row on the expected date ends the run.
pub fn trailing_streak(today: NaiveDate, completions: &[GoalCompletion]) -> u32 {
    let mut expected = today;
    let mut streak = 0u32;

    for completion in completions {
        let Some(date) = parse_date_key(&completion.completion_date) else {
            break;
        };

        if date > expected {
            continue;
        }

        if streak == 0 && expected == today && Some(date) == today.pred_opt() {
            expected = date;
        }

        if date == expected {
            if !completion.goal_met {
                break;
            }
            streak += 1;
            match expected.pred_opt() {
                Some(previous) => expected = previous,
                None => break,
            }
        } else {
            // Gap: no completion row for the expected date.
            break;
        }
    }

    streak
}

/// Current streak state for one reward kind.
#[derive(Debug, Clone)]
pub struct StreakStatus {
    pub current: u32,
    /// Award date of the most recent reward of the kind (`YYYY-MM-DD`)
    pub anchor_date: Option<String>,
}

/// Streak accounting engine.
#[derive(Clone)]
pub struct StreakEngine {
    db: FirestoreDb,
}

impl StreakEngine {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Trailing streak over the completions strictly after `anchor`
    /// (all completions when there is no prior reward).
    pub async fn trailing_streak_after(
        &self,
        user_id: &str,
        anchor: Option<&str>,
        today: NaiveDate,
    ) -> Result<u32> {
        let completions = self.db.get_completions_after(user_id, anchor).await?;
        Ok(trailing_streak(today, &completions))
    }

    /// Current streak for a reward kind, anchored to the kind's most
    /// recent award date.
    pub async fn current_streak(
        &self,
        user_id: &str,
        kind: RewardKind,
        today: NaiveDate,
    ) -> Result<StreakStatus> {
        let anchor = match kind {
            RewardKind::Pet => self
                .db
                .list_user_pets(user_id)
                .await?
                .last()
                .and_then(|p| date_part(&p.created_at).map(str::to_string)),
            RewardKind::Furniture => self
                .db
                .list_user_furniture(user_id)
                .await?
                .first()
                .and_then(|f| date_part(&f.created_at).map(str::to_string)),
        };

        let current = self
            .trailing_streak_after(user_id, anchor.as_deref(), today)
            .await?;

        Ok(StreakStatus {
            current,
            anchor_date: anchor,
        })
    }
}
