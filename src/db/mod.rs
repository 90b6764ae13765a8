//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const PROFILES: &str = "profiles";
    pub const DAILY_STEPS: &str = "daily_steps";
    /// Step adapter snapshots (keyed by user id)
    pub const STEP_SNAPSHOTS: &str = "step_snapshots";
    pub const GOAL_COMPLETIONS: &str = "goal_completions";
    pub const USERS_PETS: &str = "users_pets";
    pub const USERS_FURNITURE: &str = "users_furniture";
    pub const PETS: &str = "pets";
    pub const FURNITURE: &str = "furniture";
}
