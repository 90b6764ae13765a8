//! User profile model for storage and API.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_STEP_GOAL;

/// Which step source drives the user-facing count.
///
/// Both sources keep tracking regardless of the selection, so switching
/// is instantaneous and lossless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSource {
    #[default]
    Pedometer,
    HealthIntegration,
}

/// User profile stored in Firestore (document ID = user id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// User id issued by the identity provider (UUID string)
    pub id: String,
    /// Daily step goal
    pub step_goal: u32,
    /// Selected step source
    #[serde(default)]
    pub step_source: StepSource,
    /// Minute offset from UTC used to resolve the user's calendar day
    #[serde(default)]
    pub tz_offset_minutes: i32,
    /// Cached streak for display; eligibility always recomputes
    #[serde(default)]
    pub current_streak: u32,
    /// Date the cached streak was last refreshed (`YYYY-MM-DD`)
    #[serde(default)]
    pub last_streak_update: Option<String>,
    /// Date of the most recent furniture award (`YYYY-MM-DD`)
    #[serde(default)]
    pub last_furniture_date: Option<String>,
    /// When the profile was created
    pub created_at: String,
    /// Last profile update timestamp
    pub updated_at: String,
}

impl Profile {
    /// A fresh profile with default goal and source.
    pub fn new_default(user_id: &str, now: &str) -> Self {
        Self {
            id: user_id.to_string(),
            step_goal: DEFAULT_STEP_GOAL,
            step_source: StepSource::default(),
            tz_offset_minutes: 0,
            current_streak: 0,
            last_streak_update: None,
            last_furniture_date: None,
            created_at: now.to_string(),
            updated_at: now.to_string(),
        }
    }
}
