// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Profiles (per-user configuration)
//! - Daily steps and step snapshots
//! - Goal completions (streak source of truth)
//! - Reward records (pets, furniture) and catalogs
//!
//! Relational uniqueness is expressed through composite document ids:
//! `{user}_{date}` for day-keyed rows and `{user}_m{n}` for pet
//! milestones. Award writes run in transactions that read the target
//! document first, so a duplicate award in the same window loses the
//! race instead of inserting a second record.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{
    DailySteps, Furniture, GoalCompletion, Pet, Profile, StepSnapshot, UserFurniture, UserPet,
};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

/// Document id for a (user, date) keyed row.
pub fn day_doc_id(user_id: &str, date: &str) -> String {
    format!("{}_{}", user_id, date)
}

/// Document id for the n-th pet milestone of a user.
pub fn pet_milestone_doc_id(user_id: &str, milestone: u32) -> String {
    format!("{}_m{}", user_id, milestone)
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // ExternalJwtFunctionSource provides a dummy token without needing a
        // custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Profile Operations ──────────────────────────────────────

    /// Get a user's profile.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PROFILES)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a profile.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PROFILES)
            .document_id(&profile.id)
            .object(profile)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Daily Step Operations ───────────────────────────────────

    /// Get the daily step row for a (user, date).
    pub async fn get_daily_steps(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<Option<DailySteps>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::DAILY_STEPS)
            .obj()
            .one(&day_doc_id(user_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert the daily step row. The `{user}_{date}` document id is the
    /// conflict target: repeated calls for the same day overwrite, never
    /// duplicate.
    pub async fn upsert_daily_steps(&self, row: &DailySteps) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::DAILY_STEPS)
            .document_id(day_doc_id(&row.user_id, &row.date))
            .object(row)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Step Snapshot Operations ────────────────────────────────

    /// Get the step adapter's durable snapshot for a user.
    pub async fn get_step_snapshot(&self, user_id: &str) -> Result<Option<StepSnapshot>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::STEP_SNAPSHOTS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store the step adapter's snapshot (one document per user).
    pub async fn set_step_snapshot(&self, snapshot: &StepSnapshot) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::STEP_SNAPSHOTS)
            .document_id(&snapshot.user_id)
            .object(snapshot)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Goal Completion Operations ──────────────────────────────

    /// Get the completion row for a (user, date).
    pub async fn get_goal_completion(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<Option<GoalCompletion>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::GOAL_COMPLETIONS)
            .obj()
            .one(&day_doc_id(user_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert the completion row for a (user, date).
    pub async fn upsert_goal_completion(&self, row: &GoalCompletion) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::GOAL_COMPLETIONS)
            .document_id(day_doc_id(&row.user_id, &row.completion_date))
            .object(row)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get completions for a user, newest first, optionally restricted to
    /// dates strictly after `after_date` (the streak anchor).
    pub async fn get_completions_after(
        &self,
        user_id: &str,
        after_date: Option<&str>,
    ) -> Result<Vec<GoalCompletion>, AppError> {
        let user_id = user_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::GOAL_COMPLETIONS);

        let query = if let Some(date) = after_date {
            let date = date.to_string();
            query.filter(move |q| {
                q.for_all([
                    q.field("user_id").eq(user_id.clone()),
                    q.field("completion_date").greater_than(date.clone()),
                ])
            })
        } else {
            query.filter(move |q| q.field("user_id").eq(user_id.clone()))
        };

        query
            .order_by([(
                "completion_date",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Reward Catalog Operations ───────────────────────────────

    /// List the pet catalog.
    pub async fn list_pet_catalog(&self) -> Result<Vec<Pet>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::PETS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List the furniture catalog.
    pub async fn list_furniture_catalog(&self) -> Result<Vec<Furniture>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::FURNITURE)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Upsert a pet catalog entry (content tooling and tests).
    pub async fn upsert_catalog_pet(&self, pet: &Pet) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PETS)
            .document_id(pet.id.to_string())
            .object(pet)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Upsert a furniture catalog entry (content tooling and tests).
    pub async fn upsert_catalog_furniture(&self, furniture: &Furniture) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::FURNITURE)
            .document_id(furniture.id.to_string())
            .object(furniture)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Reward Record Operations ────────────────────────────────

    /// List a user's pets, oldest first (milestone order).
    pub async fn list_user_pets(&self, user_id: &str) -> Result<Vec<UserPet>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS_PETS)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([("created_at", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List a user's furniture, newest first.
    pub async fn list_user_furniture(&self, user_id: &str) -> Result<Vec<UserFurniture>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS_FURNITURE)
            .filter(move |q| q.field("user_id").eq(user_id.clone()))
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get the furniture award for a (user, date) window, if any.
    ///
    /// Direct document lookup: the award window key IS the document id.
    pub async fn get_furniture_award(
        &self,
        user_id: &str,
        date: &str,
    ) -> Result<Option<UserFurniture>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS_FURNITURE)
            .obj()
            .one(&day_doc_id(user_id, date))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Atomic Award Operations ─────────────────────────────────

    /// Atomically insert a pet award for its milestone window.
    ///
    /// Runs a transaction that reads `users_pets/{record.id}` first: the
    /// read registers the document for conflict detection, and an
    /// existing document means the milestone was already awarded.
    ///
    /// Returns `true` if the award was inserted, `false` if the window
    /// was already consumed (idempotent duplicate).
    pub async fn award_pet_atomic(&self, record: &UserPet) -> Result<bool, AppError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let existing: Option<UserPet> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS_PETS)
            .obj()
            .one(&record.id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read award in transaction: {}", e)))?;

        if existing.is_some() {
            tracing::debug!(
                user_id = %record.user_id,
                window = %record.id,
                "Pet milestone already awarded (idempotent skip)"
            );
            let _ = transaction.rollback().await;
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS_PETS)
            .document_id(&record.id)
            .object(record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add award to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id = %record.user_id,
            pet_id = record.pet_id,
            window = %record.id,
            "Pet awarded atomically"
        );

        Ok(true)
    }

    /// Atomically insert a furniture award for its daily window and stamp
    /// `profiles.last_furniture_date` in the same transaction.
    ///
    /// Returns `true` if the award was inserted, `false` if the day's
    /// window was already consumed.
    pub async fn award_furniture_atomic(
        &self,
        record: &UserFurniture,
        awarded_on: &str,
    ) -> Result<bool, AppError> {
        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let existing: Option<UserFurniture> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS_FURNITURE)
            .obj()
            .one(&record.id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read award in transaction: {}", e)))?;

        if existing.is_some() {
            tracing::debug!(
                user_id = %record.user_id,
                window = %record.id,
                "Furniture already awarded today (idempotent skip)"
            );
            let _ = transaction.rollback().await;
            return Ok(false);
        }

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS_FURNITURE)
            .document_id(&record.id)
            .object(record)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add award to transaction: {}", e)))?;

        // Stamp the profile inside the same transaction so the award and
        // the profile's last_furniture_date cannot diverge.
        if let Some(mut profile) = self.get_profile(&record.user_id).await? {
            profile.last_furniture_date = Some(awarded_on.to_string());
            profile.updated_at = crate::time_utils::now_rfc3339();

            self.get_client()?
                .fluent()
                .update()
                .in_col(collections::PROFILES)
                .document_id(&profile.id)
                .object(&profile)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add profile to transaction: {}", e))
                })?;
        }

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id = %record.user_id,
            furniture_id = record.furniture_id,
            window = %record.id,
            "Furniture awarded atomically"
        );

        Ok(true)
    }

    // ─── User Data Deletion ──────────────────────────────────────

    /// Delete ALL data for a user.
    ///
    /// Deletes from all collections:
    /// - `goal_completions`, `daily_steps` (query by user_id)
    /// - `users_pets`, `users_furniture` (query by user_id)
    /// - `step_snapshots/{user_id}`
    /// - `profiles/{user_id}`
    ///
    /// Returns the number of documents deleted.
    pub async fn delete_user_data(&self, user_id: &str) -> Result<usize, AppError> {
        let mut deleted_count = 0;

        deleted_count += self
            .delete_by_user(collections::GOAL_COMPLETIONS, user_id, |c: &GoalCompletion| {
                day_doc_id(&c.user_id, &c.completion_date)
            })
            .await?;

        deleted_count += self
            .delete_by_user(collections::DAILY_STEPS, user_id, |d: &DailySteps| {
                day_doc_id(&d.user_id, &d.date)
            })
            .await?;

        deleted_count += self
            .delete_by_user(collections::USERS_PETS, user_id, |p: &UserPet| p.id.clone())
            .await?;

        deleted_count += self
            .delete_by_user(collections::USERS_FURNITURE, user_id, |f: &UserFurniture| {
                f.id.clone()
            })
            .await?;

        for collection in [collections::STEP_SNAPSHOTS, collections::PROFILES] {
            self.get_client()?
                .fluent()
                .delete()
                .from(collection)
                .document_id(user_id)
                .execute()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            deleted_count += 1;
        }

        tracing::info!(user_id, deleted_count, "User data deletion complete");

        Ok(deleted_count)
    }

    /// Query a collection by user_id and delete every matching document,
    /// with bounded concurrency.
    async fn delete_by_user<T, F>(
        &self,
        collection: &str,
        user_id: &str,
        id_extractor: F,
    ) -> Result<usize, AppError>
    where
        T: for<'de> serde::Deserialize<'de> + Send,
        F: Fn(&T) -> String,
    {
        let uid = user_id.to_string();
        let rows: Vec<T> = self
            .get_client()?
            .fluent()
            .select()
            .from(collection)
            .filter(move |q| q.field("user_id").eq(uid.clone()))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let count = rows.len();
        let doc_ids: Vec<String> = rows.iter().map(&id_extractor).collect();
        let client = self.get_client()?;

        stream::iter(doc_ids)
            .map(|doc_id| async move {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(&doc_id)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::debug!(user_id, collection, count, "Deleted user documents");

        Ok(count)
    }
}
