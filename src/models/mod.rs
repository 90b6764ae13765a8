// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod completion;
pub mod profile;
pub mod reward;
pub mod steps;

pub use completion::GoalCompletion;
pub use profile::{Profile, StepSource};
pub use reward::{Furniture, Pet, RewardKind, UserFurniture, UserPet};
pub use steps::{DailySteps, StepSnapshot};
