// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.
//!
//! Clients stream raw pedometer samples and lifecycle events here;
//! everything that gates rewards happens server-side. Claim handlers
//! never trust a client-side eligibility cache.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Profile, RewardKind, StepSource, UserFurniture, UserPet};
use crate::services::progress::progress_percent;
use crate::services::rewards::{AwardOutcome, AwardedReward, EligibilityStatus};
use crate::time_utils::{now_rfc3339, today_for_offset};
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const MAX_STEP_GOAL: u32 = 200_000;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/me/goal", put(update_goal))
        .route("/api/me/source", put(update_source))
        .route("/api/me/timezone", put(update_timezone))
        .route("/api/steps", get(get_steps))
        .route("/api/steps/device", post(post_device_sample))
        .route("/api/steps/sync", post(post_sync))
        .route("/api/steps/flush", post(post_flush))
        .route("/api/streak/{kind}", get(get_streak))
        .route("/api/rewards/{kind}", get(get_reward_status))
        .route("/api/rewards/{kind}/claim", post(post_claim))
        .route("/api/pets", get(get_pets))
        .route("/api/furniture", get(get_furniture))
        .route("/api/account", delete(delete_account))
}

/// Load the user's profile, creating a default one on first access.
async fn load_profile(state: &AppState, user_id: &str) -> Result<Profile> {
    if let Some(profile) = state.db.get_profile(user_id).await? {
        return Ok(profile);
    }

    let profile = Profile::new_default(user_id, &now_rfc3339());
    state.db.upsert_profile(&profile).await?;
    tracing::info!(user_id, "Created default profile");
    Ok(profile)
}

fn parse_kind(segment: &str) -> Result<RewardKind> {
    RewardKind::from_path(segment)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown reward kind: {}", segment)))
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
pub struct UserResponse {
    pub user_id: String,
    pub step_goal: u32,
    pub step_source: String,
    pub tz_offset_minutes: i32,
    pub current_streak: u32,
    pub last_furniture_date: Option<String>,
}

fn user_response(profile: Profile) -> UserResponse {
    UserResponse {
        user_id: profile.id,
        step_goal: profile.step_goal,
        step_source: match profile.step_source {
            StepSource::Pedometer => "pedometer".to_string(),
            StepSource::HealthIntegration => "health_integration".to_string(),
        },
        tz_offset_minutes: profile.tz_offset_minutes,
        current_streak: profile.current_streak,
        last_furniture_date: profile.last_furniture_date,
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = load_profile(&state, &user.user_id).await?;
    Ok(Json(user_response(profile)))
}

#[derive(Deserialize, Validate)]
struct UpdateGoalRequest {
    #[validate(range(min = 1, max = 200_000))]
    step_goal: u32,
}

/// Update the daily step goal.
async fn update_goal(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateGoalRequest>,
) -> Result<Json<UserResponse>> {
    body.validate().map_err(|e| {
        AppError::BadRequest(format!(
            "step_goal must be between 1 and {}: {}",
            MAX_STEP_GOAL, e
        ))
    })?;

    let mut profile = load_profile(&state, &user.user_id).await?;
    profile.step_goal = body.step_goal;
    profile.updated_at = now_rfc3339();
    state.db.upsert_profile(&profile).await?;

    tracing::info!(user_id = %user.user_id, goal = body.step_goal, "Step goal updated");

    Ok(Json(user_response(profile)))
}

#[derive(Deserialize, Validate)]
struct UpdateTimezoneRequest {
    /// Minute offset from UTC (UTC-14:00 to UTC+14:00)
    #[validate(range(min = -840, max = 840))]
    tz_offset_minutes: i32,
}

/// Update the timezone offset that resolves the user's calendar day.
async fn update_timezone(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateTimezoneRequest>,
) -> Result<Json<UserResponse>> {
    body.validate()
        .map_err(|e| AppError::BadRequest(format!("invalid tz_offset_minutes: {}", e)))?;

    let mut profile = load_profile(&state, &user.user_id).await?;
    profile.tz_offset_minutes = body.tz_offset_minutes;
    profile.updated_at = now_rfc3339();
    state.db.upsert_profile(&profile).await?;

    Ok(Json(user_response(profile)))
}

#[derive(Deserialize)]
struct UpdateSourceRequest {
    source: StepSource,
}

/// Switch the active step source. Both sources keep tracking.
async fn update_source(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateSourceRequest>,
) -> Result<Json<UserResponse>> {
    let mut profile = load_profile(&state, &user.user_id).await?;
    state.counter.switch_source(&mut profile, body.source).await?;
    Ok(Json(user_response(profile)))
}

// ─── Steps ───────────────────────────────────────────────────

/// Step progress response.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
pub struct ProgressResponse {
    pub date: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub steps: u64,
    pub goal: u32,
    pub percent: u8,
    pub goal_met: bool,
    pub source: String,
}

fn progress_response(profile: &Profile, date: String, steps: u64) -> ProgressResponse {
    let goal = profile.step_goal;
    ProgressResponse {
        date,
        steps,
        goal,
        percent: progress_percent(steps, goal),
        goal_met: goal > 0 && steps >= goal as u64,
        source: match profile.step_source {
            StepSource::Pedometer => "pedometer".to_string(),
            StepSource::HealthIntegration => "health_integration".to_string(),
        },
    }
}

/// Current count for the active source.
async fn get_steps(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProgressResponse>> {
    let profile = load_profile(&state, &user.user_id).await?;
    let today = today_for_offset(profile.tz_offset_minutes);

    let steps = state
        .counter
        .current(&user.user_id, today, profile.step_source)
        .await;

    Ok(Json(progress_response(
        &profile,
        crate::time_utils::date_key(today),
        steps,
    )))
}

#[derive(Deserialize)]
struct DeviceSampleRequest {
    /// Cumulative steps since the device subscription started
    session_steps: u64,
}

/// Ingest a pedometer sample and re-evaluate today's progress.
async fn post_device_sample(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<DeviceSampleRequest>,
) -> Result<Json<ProgressResponse>> {
    let profile = load_profile(&state, &user.user_id).await?;
    let today = today_for_offset(profile.tz_offset_minutes);

    state
        .counter
        .record_device_sample(&user.user_id, today, body.session_steps)
        .await;

    let steps = state
        .counter
        .current(&user.user_id, today, profile.step_source)
        .await;

    let outcome = state
        .progress
        .record(&user.user_id, today, steps, profile.step_goal)
        .await?;

    Ok(Json(progress_response(&profile, outcome.date, steps)))
}

/// App foregrounded / screen focus: reconcile missed steps and start
/// the foreground health poll.
async fn post_sync(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProgressResponse>> {
    let profile = load_profile(&state, &user.user_id).await?;
    let today = today_for_offset(profile.tz_offset_minutes);

    state
        .counter
        .sync_with_health(&user.user_id, today, profile.tz_offset_minutes)
        .await;

    let steps = state
        .counter
        .current(&user.user_id, today, profile.step_source)
        .await;

    let outcome = state
        .progress
        .record(&user.user_id, today, steps, profile.step_goal)
        .await?;

    Ok(Json(progress_response(&profile, outcome.date, steps)))
}

/// App backgrounded: flush the counter snapshot synchronously and stop
/// the foreground health poll.
async fn post_flush(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProgressResponse>> {
    let profile = load_profile(&state, &user.user_id).await?;
    let today = today_for_offset(profile.tz_offset_minutes);

    state.counter.flush(&user.user_id, today).await;

    let steps = state
        .counter
        .current(&user.user_id, today, profile.step_source)
        .await;

    let outcome = state
        .progress
        .record(&user.user_id, today, steps, profile.step_goal)
        .await?;

    Ok(Json(progress_response(&profile, outcome.date, steps)))
}

// ─── Streaks & Rewards ───────────────────────────────────────

/// Streak status response. `days_remaining` comes from the same
/// escalation function the award path uses, so the UI and the engine
/// cannot disagree.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "mobile/src/lib/generated/")
)]
pub struct StreakResponse {
    pub kind: String,
    pub current_streak: u32,
    pub required_streak: u32,
    pub days_remaining: u32,
    pub total_earned: u32,
    pub completed_today: bool,
}

/// Current streak for a reward kind.
async fn get_streak(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
) -> Result<Json<StreakResponse>> {
    let kind = parse_kind(&kind)?;
    let profile = load_profile(&state, &user.user_id).await?;
    let today = today_for_offset(profile.tz_offset_minutes);

    let status = state.rewards.eligibility(&user.user_id, kind, today).await?;

    if kind == RewardKind::Pet {
        state.rewards.refresh_streak_cache(&user.user_id, today).await;
    }

    Ok(Json(StreakResponse {
        kind: kind.as_str().to_string(),
        current_streak: status.current_streak,
        required_streak: status.required_streak,
        days_remaining: status.days_remaining,
        total_earned: status.total_earned,
        completed_today: status.completed_today,
    }))
}

/// Eligibility state for a reward kind.
async fn get_reward_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
) -> Result<Json<EligibilityStatus>> {
    let kind = parse_kind(&kind)?;
    let profile = load_profile(&state, &user.user_id).await?;
    let today = today_for_offset(profile.tz_offset_minutes);

    let status = state.rewards.eligibility(&user.user_id, kind, today).await?;
    Ok(Json(status))
}

/// Claim response. `success: false` with a status is the normal
/// "not eligible" outcome, not an error.
#[derive(Serialize)]
pub struct ClaimResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<AwardedReward>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EligibilityStatus>,
}

/// Attempt to claim a reward.
async fn post_claim(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(kind): Path<String>,
) -> Result<Json<ClaimResponse>> {
    let kind = parse_kind(&kind)?;
    let profile = load_profile(&state, &user.user_id).await?;
    let today = today_for_offset(profile.tz_offset_minutes);

    match state.rewards.award(&user.user_id, kind, today).await? {
        AwardOutcome::Awarded(reward) => Ok(Json(ClaimResponse {
            success: true,
            reward: Some(reward),
            status: None,
        })),
        AwardOutcome::NotEligible(status) => Ok(Json(ClaimResponse {
            success: false,
            reward: None,
            status: Some(status),
        })),
    }
}

// ─── Owned Rewards ───────────────────────────────────────────

/// List the user's pets, oldest first.
async fn get_pets(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<UserPet>>> {
    Ok(Json(state.db.list_user_pets(&user.user_id).await?))
}

/// List the user's furniture, newest first.
async fn get_furniture(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<UserFurniture>>> {
    Ok(Json(state.db.list_user_furniture(&user.user_id).await?))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub deleted_documents: usize,
}

/// Delete the user's account and all associated data.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DeleteAccountResponse>> {
    tracing::info!(user_id = %user.user_id, "User-initiated account deletion");

    let deleted = state.db.delete_user_data(&user.user_id).await?;

    Ok(Json(DeleteAccountResponse {
        success: true,
        deleted_documents: deleted,
    }))
}
