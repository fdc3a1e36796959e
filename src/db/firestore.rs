// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profiles, club membership)
//! - Clubs (creation, join-code lookup)
//! - Workshops (scoped visibility)
//! - Submissions (idempotent per-(user, workshop) upserts)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Club, Submission, User, Workshop};
use futures_util::{stream, StreamExt};

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// How many times club creation retries a colliding join code before
/// giving up.
const JOIN_CODE_ATTEMPTS: usize = 5;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated
        // connection to avoid local credential warnings and leakage.
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

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user by their Slack user ID.
    pub async fn get_user(&self, slack_user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(slack_user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user.
    pub async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.slack_user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Point a user at a club (or detach with `None`).
    ///
    /// Fetch-modify-write to preserve the other profile fields.
    pub async fn set_user_club(
        &self,
        slack_user_id: &str,
        club_id: Option<String>,
    ) -> Result<User, AppError> {
        let mut user = self
            .get_user(slack_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", slack_user_id)))?;

        user.club_id = club_id;
        self.upsert_user(&user).await?;
        Ok(user)
    }

    /// List every user (admin views join against this).
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Club Operations ─────────────────────────────────────────

    /// Get a club by its document ID.
    pub async fn get_club(&self, club_id: &str) -> Result<Option<Club>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CLUBS)
            .obj()
            .one(club_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a club by its shareable join code.
    pub async fn find_club_by_join_code(&self, join_code: &str) -> Result<Option<Club>, AppError> {
        let join_code = join_code.to_string();
        let clubs: Vec<Club> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::CLUBS)
            .filter(move |q| q.for_all([q.field("join_code").eq(join_code.clone())]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(clubs.into_iter().next())
    }

    /// List every club (admin view).
    pub async fn list_clubs(&self) -> Result<Vec<Club>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::CLUBS)
            .order_by([(
                "created_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Atomically create a club and bind it to its creating leader.
    ///
    /// Both writes go through one Firestore transaction, so a failure on
    /// either side leaves no partial state: no club row without an owning
    /// user can ever be observed. Returns the club with its final join
    /// code (regenerated on collision) and the updated user.
    pub async fn create_club_for_user(
        &self,
        mut club: Club,
        slack_user_id: &str,
    ) -> Result<(Club, User), AppError> {
        let mut user = self
            .get_user(slack_user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", slack_user_id)))?;

        // Join codes are random, not derived; re-roll until unused.
        let mut attempts = 0;
        while self.find_club_by_join_code(&club.join_code).await?.is_some() {
            attempts += 1;
            if attempts >= JOIN_CODE_ATTEMPTS {
                return Err(AppError::Internal(anyhow::anyhow!(
                    "Could not allocate an unused join code"
                )));
            }
            club.join_code = crate::models::club::generate_join_code();
        }

        user.club_id = Some(club.id.clone());

        let mut transaction = self
            .get_client()?
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::CLUBS)
            .document_id(&club.id)
            .object(&club)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add club to transaction: {}", e)))?;

        self.get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(&user.slack_user_id)
            .object(&user)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add user update to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            club_id = %club.id,
            join_code = %club.join_code,
            leader = %user.slack_user_id,
            "Club created"
        );

        Ok((club, user))
    }

    /// Hard-delete a club and detach its members.
    ///
    /// Submissions are keyed by (user, workshop) and are left in place;
    /// workshops scoped to the dead join code simply stop matching.
    pub async fn delete_club(&self, club_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::CLUBS)
            .document_id(club_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let club_id_owned = club_id.to_string();
        let members: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(move |q| q.for_all([q.field("club_id").eq(club_id_owned.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let detached = members.len();
        let client = self.get_client()?;

        stream::iter(members)
            .map(|mut member| async move {
                member.club_id = None;
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(collections::USERS)
                    .document_id(&member.slack_user_id)
                    .object(&member)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        tracing::info!(club_id, detached, "Club deleted, members detached");
        Ok(())
    }

    // ─── Workshop Operations ─────────────────────────────────────

    /// Get a workshop by slug.
    pub async fn get_workshop(&self, slug: &str) -> Result<Option<Workshop>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKSHOPS)
            .obj()
            .one(slug)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a workshop definition.
    pub async fn upsert_workshop(&self, workshop: &Workshop) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKSHOPS)
            .document_id(&workshop.slug)
            .object(workshop)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// List workshops visible to a member of the club with the given join
    /// code: globally-scoped workshops plus those scoped to that code.
    pub async fn list_visible_workshops(
        &self,
        club_join_code: Option<&str>,
    ) -> Result<Vec<Workshop>, AppError> {
        let mut workshops = self
            .query_workshops_by_scope(crate::models::workshop::SCOPE_GLOBAL)
            .await?;

        if let Some(code) = club_join_code {
            workshops.extend(self.query_workshops_by_scope(code).await?);
        }

        Ok(workshops)
    }

    async fn query_workshops_by_scope(&self, scope: &str) -> Result<Vec<Workshop>, AppError> {
        let scope = scope.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WORKSHOPS)
            .filter(move |q| q.for_all([q.field("scope").eq(scope.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List every workshop regardless of scope (admin view).
    pub async fn list_workshops(&self) -> Result<Vec<Workshop>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::WORKSHOPS)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Submission Operations ───────────────────────────────────

    /// Get the submission for a (user, workshop) pair, if any.
    pub async fn get_submission(
        &self,
        user_id: &str,
        workshop_slug: &str,
    ) -> Result<Option<Submission>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBMISSIONS)
            .obj()
            .one(&Submission::doc_id(user_id, workshop_slug))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a submission by its composite document ID.
    pub async fn get_submission_by_id(&self, doc_id: &str) -> Result<Option<Submission>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::SUBMISSIONS)
            .obj()
            .one(doc_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or overwrite the submission for its (user, workshop) pair.
    ///
    /// Single keyed document write; last write wins and at most one record
    /// exists per pair.
    pub async fn upsert_submission(&self, submission: &Submission) -> Result<(), AppError> {
        let doc_id = Submission::doc_id(&submission.user_id, &submission.workshop_slug);
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::SUBMISSIONS)
            .document_id(&doc_id)
            .object(submission)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All submissions by one user.
    pub async fn list_submissions_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Submission>, AppError> {
        let user_id = user_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBMISSIONS)
            .filter(move |q| q.for_all([q.field("user_id").eq(user_id.clone())]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every submission, newest first (admin view; filtering is
    /// client-side over the full set).
    pub async fn list_submissions(&self) -> Result<Vec<Submission>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::SUBMISSIONS)
            .order_by([(
                "submitted_at",
                firestore::FirestoreQueryDirection::Descending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Hard-delete a submission by its composite document ID.
    pub async fn delete_submission(&self, doc_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::SUBMISSIONS)
            .document_id(doc_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
