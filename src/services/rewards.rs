// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward eligibility and issuance.
//!
//! Each reward kind carries its own policy: how the streak requirement
//! escalates with rewards already earned, whether today's goal must be
//! met, and how the catalog item is selected. The policy's escalation
//! function is the single source of truth: the same call decides
//! eligibility and fills the "N more days needed" display.
//!
//! Awards are at-most-once per window. In-process calls serialize on a
//! per-(user, kind) mutex, and the actual guarantee is the transactional
//! check-then-insert on the window-keyed document id, which holds even
//! across processes.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::DashMap;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::db::firestore::{day_doc_id, pet_milestone_doc_id};
use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Furniture, Pet, RewardKind, UserFurniture, UserPet};
use crate::services::StreakEngine;
use crate::time_utils::{date_key, date_part, now_rfc3339};

/// Eligibility policy for one reward kind.
#[derive(Debug, Clone)]
pub struct RewardPolicy {
    /// Streak requirement per rewards-already-earned; the last entry
    /// applies to everything beyond it.
    pub streak_tiers: &'static [u32],
    /// Whether today's goal must be met (beyond the streak requirement)
    pub needs_completion_today: bool,
    /// Whether the first reward is granted without any requirement
    pub first_award_unconditional: bool,
    /// Prefer catalog items the user does not own yet, falling back to
    /// the full catalog once everything is owned
    pub prefer_unowned: bool,
}

/// Pets: first immediately, second after a 3-day streak, every further
/// pet after a 7-day streak.
pub const PET_POLICY: RewardPolicy = RewardPolicy {
    streak_tiers: &[0, 3, 7],
    needs_completion_today: true,
    first_award_unconditional: true,
    prefer_unowned: true,
};

/// Furniture: every day with a met goal is an independent window, no
/// escalation, duplicates allowed.
pub const FURNITURE_POLICY: RewardPolicy = RewardPolicy {
    streak_tiers: &[0],
    needs_completion_today: true,
    first_award_unconditional: false,
    prefer_unowned: false,
};

impl RewardPolicy {
    /// Streak required for the next reward given the total already
    /// earned of this kind.
    pub fn required_streak(&self, total_earned: u32) -> u32 {
        let idx = (total_earned as usize).min(self.streak_tiers.len().saturating_sub(1));
        self.streak_tiers.get(idx).copied().unwrap_or(0)
    }
}

/// Eligibility state for one (user, kind).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardState {
    /// Streak requirement unmet
    Locked,
    /// Requirement met, not yet awarded in the current window
    Eligible,
    /// The current window's reward was already issued
    AwardedToday,
}

/// Full eligibility view for one (user, kind).
#[derive(Debug, Clone, Serialize)]
pub struct EligibilityStatus {
    pub kind: RewardKind,
    pub state: RewardState,
    pub total_earned: u32,
    pub current_streak: u32,
    pub required_streak: u32,
    pub days_remaining: u32,
    pub completed_today: bool,
}

/// A successfully issued reward.
#[derive(Debug, Clone, Serialize)]
pub struct AwardedReward {
    pub record_id: String,
    pub kind: RewardKind,
    pub item_id: u32,
    pub earned_via_streak: bool,
    pub streak_requirement: u32,
}

/// Result of an award attempt. Ineligibility is a normal negative
/// outcome, not an error.
#[derive(Debug, Clone)]
pub enum AwardOutcome {
    Awarded(AwardedReward),
    NotEligible(EligibilityStatus),
}

/// Reward eligibility and issuance engine.
#[derive(Clone)]
pub struct RewardService {
    db: FirestoreDb,
    streaks: StreakEngine,
    award_locks: Arc<DashMap<(String, RewardKind), Arc<Mutex<()>>>>,
    pet_policy: RewardPolicy,
    furniture_policy: RewardPolicy,
}

impl RewardService {
    pub fn new(db: FirestoreDb, streaks: StreakEngine) -> Self {
        Self {
            db,
            streaks,
            award_locks: Arc::new(DashMap::new()),
            pet_policy: PET_POLICY,
            furniture_policy: FURNITURE_POLICY,
        }
    }

    pub fn policy(&self, kind: RewardKind) -> &RewardPolicy {
        match kind {
            RewardKind::Pet => &self.pet_policy,
            RewardKind::Furniture => &self.furniture_policy,
        }
    }

    /// Compute the current eligibility state for a (user, kind).
    ///
    /// Always recomputes from persisted rows; nothing here trusts a
    /// client-side cache.
    pub async fn eligibility(
        &self,
        user_id: &str,
        kind: RewardKind,
        today: NaiveDate,
    ) -> Result<EligibilityStatus> {
        let policy = self.policy(kind);
        let today_key = date_key(today);

        let (total_earned, anchor, awarded_in_window, last_award_today) = match kind {
            RewardKind::Pet => {
                let pets = self.db.list_user_pets(user_id).await?;
                let anchor = pets
                    .last()
                    .and_then(|p| date_part(&p.created_at).map(str::to_string));
                let last_today = anchor.as_deref() == Some(today_key.as_str());
                // A pet milestone window is consumed by the award itself:
                // the next milestone has a higher bar and a new anchor.
                (pets.len() as u32, anchor, false, last_today)
            }
            RewardKind::Furniture => {
                let earned_today = self
                    .db
                    .get_furniture_award(user_id, &today_key)
                    .await?
                    .is_some();
                let furniture = self.db.list_user_furniture(user_id).await?;
                let anchor = furniture
                    .first()
                    .and_then(|f| date_part(&f.created_at).map(str::to_string));
                (furniture.len() as u32, anchor, earned_today, earned_today)
            }
        };

        let required_streak = policy.required_streak(total_earned);

        let completed_today = self
            .db
            .get_goal_completion(user_id, &today_key)
            .await?
            .map(|c| c.goal_met)
            .unwrap_or(false);

        let current_streak = self
            .streaks
            .trailing_streak_after(user_id, anchor.as_deref(), today)
            .await?;

        let requirement_met = (total_earned == 0 && policy.first_award_unconditional)
            || ((!policy.needs_completion_today || completed_today)
                && current_streak >= required_streak);

        let state = if awarded_in_window {
            RewardState::AwardedToday
        } else if requirement_met {
            RewardState::Eligible
        } else if last_award_today {
            RewardState::AwardedToday
        } else {
            RewardState::Locked
        };

        Ok(EligibilityStatus {
            kind,
            state,
            total_earned,
            current_streak,
            required_streak,
            days_remaining: required_streak.saturating_sub(current_streak),
            completed_today,
        })
    }

    /// Attempt to issue a reward. The eligibility precondition is
    /// re-checked here, server-side, under the per-(user, kind) lock.
    pub async fn award(
        &self,
        user_id: &str,
        kind: RewardKind,
        today: NaiveDate,
    ) -> Result<AwardOutcome> {
        let lock = self
            .award_locks
            .entry((user_id.to_string(), kind))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let status = self.eligibility(user_id, kind, today).await?;
        if status.state != RewardState::Eligible {
            tracing::debug!(user_id, kind = kind.as_str(), state = ?status.state, "Award refused: not eligible");
            return Ok(AwardOutcome::NotEligible(status));
        }

        match kind {
            RewardKind::Pet => self.award_pet(user_id, status, today).await,
            RewardKind::Furniture => self.award_furniture(user_id, status, today).await,
        }
    }

    async fn award_pet(
        &self,
        user_id: &str,
        status: EligibilityStatus,
        today: NaiveDate,
    ) -> Result<AwardOutcome> {
        let catalog = self.db.list_pet_catalog().await?;
        let owned: HashSet<u32> = self
            .db
            .list_user_pets(user_id)
            .await?
            .iter()
            .map(|p| p.pet_id)
            .collect();

        let pet = pick_pet(
            &catalog,
            &owned,
            self.pet_policy.prefer_unowned,
            &mut rand::thread_rng(),
        )
        .ok_or_else(|| AppError::CatalogEmpty("no pets configured".to_string()))?
        .clone();

        let record = UserPet {
            id: pet_milestone_doc_id(user_id, status.total_earned),
            user_id: user_id.to_string(),
            pet_id: pet.id,
            created_at: now_rfc3339(),
            earned_via_streak: status.total_earned > 0,
            streak_requirement: status.required_streak,
            custom_name: None,
            position_x: None,
            position_y: None,
        };

        if !self.db.award_pet_atomic(&record).await? {
            // Lost the race: the milestone window was consumed by a
            // concurrent award. Report the refreshed state.
            let status = self.eligibility(user_id, RewardKind::Pet, today).await?;
            return Ok(AwardOutcome::NotEligible(status));
        }

        self.refresh_streak_cache(user_id, today).await;

        Ok(AwardOutcome::Awarded(AwardedReward {
            record_id: record.id,
            kind: RewardKind::Pet,
            item_id: pet.id,
            earned_via_streak: record.earned_via_streak,
            streak_requirement: record.streak_requirement,
        }))
    }

    async fn award_furniture(
        &self,
        user_id: &str,
        status: EligibilityStatus,
        today: NaiveDate,
    ) -> Result<AwardOutcome> {
        let catalog = self.db.list_furniture_catalog().await?;
        let furniture = pick_furniture(&catalog, &mut rand::thread_rng())
            .ok_or_else(|| AppError::CatalogEmpty("no furniture configured".to_string()))?
            .clone();

        let today_key = date_key(today);
        let record = UserFurniture {
            id: day_doc_id(user_id, &today_key),
            user_id: user_id.to_string(),
            furniture_id: furniture.id,
            created_at: now_rfc3339(),
            user_pet_id: None,
            position_x: None,
            position_y: None,
        };

        if !self.db.award_furniture_atomic(&record, &today_key).await? {
            let status = self
                .eligibility(user_id, RewardKind::Furniture, today)
                .await?;
            return Ok(AwardOutcome::NotEligible(status));
        }

        Ok(AwardOutcome::Awarded(AwardedReward {
            record_id: record.id,
            kind: RewardKind::Furniture,
            item_id: furniture.id,
            earned_via_streak: false,
            streak_requirement: status.required_streak,
        }))
    }

    /// Refresh the profile's display-only streak cache. Failures are
    /// logged and ignored; eligibility never reads this value.
    pub(crate) async fn refresh_streak_cache(&self, user_id: &str, today: NaiveDate) {
        let result: Result<()> = async {
            if let Some(mut profile) = self.db.get_profile(user_id).await? {
                let status = self
                    .streaks
                    .current_streak(user_id, RewardKind::Pet, today)
                    .await?;
                profile.current_streak = status.current;
                profile.last_streak_update = Some(date_key(today));
                profile.updated_at = now_rfc3339();
                self.db.upsert_profile(&profile).await?;
            }
            Ok(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(user_id, error = %e, "Streak cache refresh failed");
        }
    }
}

/// Uniformly pick a pet, preferring unowned types when asked; once
/// every type is owned, fall back to the full catalog.
fn pick_pet<'a, R: Rng>(
    catalog: &'a [Pet],
    owned: &HashSet<u32>,
    prefer_unowned: bool,
    rng: &mut R,
) -> Option<&'a Pet> {
    if prefer_unowned {
        let unowned: Vec<&Pet> = catalog.iter().filter(|p| !owned.contains(&p.id)).collect();
        if let Some(pet) = unowned.choose(rng).copied() {
            return Some(pet);
        }
    }
    catalog.choose(rng)
}

/// Uniformly pick a furniture item (duplicates allowed).
fn pick_furniture<'a, R: Rng>(catalog: &'a [Furniture], rng: &mut R) -> Option<&'a Furniture> {
    catalog.choose(rng)
}
