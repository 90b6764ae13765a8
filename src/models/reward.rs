// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward catalog and award-record models.

use serde::{Deserialize, Serialize};

/// Category of unlockable item. Each kind has its own eligibility
/// policy, catalog, and award window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    Pet,
    Furniture,
}

impl RewardKind {
    /// Parse the plural path segment used by the API (`pets`, `furniture`).
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "pets" => Some(RewardKind::Pet),
            "furniture" => Some(RewardKind::Furniture),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RewardKind::Pet => "pet",
            RewardKind::Furniture => "furniture",
        }
    }
}

/// Pet catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pet {
    pub id: u32,
    pub name: String,
    pub image: String,
}

/// Furniture catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Furniture {
    pub id: u32,
    pub name: String,
    pub image: String,
}

/// A pet owned by a user. Document id `{user}_m{n}` where `n` is the
/// milestone index (total pets earned before this award), which makes
/// each milestone an at-most-once award window.
///
/// Immutable once created, except the cosmetic fields owned by the UI
/// layer (`custom_name`, positions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPet {
    /// Document id (also the award window key)
    pub id: String,
    pub user_id: String,
    pub pet_id: u32,
    pub created_at: String,
    /// False for the first, free pet
    pub earned_via_streak: bool,
    /// The streak requirement that applied at award time
    pub streak_requirement: u32,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub position_x: Option<f64>,
    #[serde(default)]
    pub position_y: Option<f64>,
}

/// A furniture item owned by a user. Document id `{user}_{date}`, which
/// makes each calendar day an at-most-once award window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFurniture {
    /// Document id (also the award window key)
    pub id: String,
    pub user_id: String,
    pub furniture_id: u32,
    pub created_at: String,
    /// Pet this furniture is placed with, if any (UI-owned)
    #[serde(default)]
    pub user_pet_id: Option<String>,
    #[serde(default)]
    pub position_x: Option<f64>,
    #[serde(default)]
    pub position_y: Option<f64>,
}
