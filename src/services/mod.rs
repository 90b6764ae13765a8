// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod counter;
pub mod health;
pub mod progress;
pub mod rewards;
pub mod streak;

pub use counter::StepCounterService;
pub use health::HealthClient;
pub use progress::{progress_percent, ProgressTracker};
pub use rewards::{AwardOutcome, EligibilityStatus, RewardService, RewardState};
pub use streak::{trailing_streak, StreakEngine};
