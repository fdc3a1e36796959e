// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! Admin routes: listings with denormalized display fields, hard
//! deletes, and workshop provisioning.
//!
//! The admin role is re-resolved from the users collection by the
//! `require_admin` middleware on every request; nothing here trusts the
//! session token beyond the user id.

use crate::error::{AppError, Result};
use crate::models::{workshop, Submission, Workshop};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

/// Admin routes; routes/mod.rs layers `require_auth` + `require_admin`
/// around these.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/submissions", get(list_submissions))
        .route("/api/admin/clubs", get(list_clubs))
        .route("/api/admin/workshops", post(upsert_workshop))
        .route("/api/admin/submissions/{id}", delete(delete_submission))
        .route("/api/admin/clubs/{id}", delete(delete_club))
}

// ─── Listings ────────────────────────────────────────────────

/// One submission row with everything the admin table displays.
/// Filtering/search happens client-side over the full set.
#[derive(Serialize)]
pub struct AdminSubmissionRow {
    /// Composite ID used for deletion
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub club_name: Option<String>,
    pub workshop_slug: String,
    pub workshop_title: String,
    pub workshop_emoji: String,
    pub event_code: String,
    pub photo: Option<String>,
    pub notes: Option<String>,
    pub submitted_at: String,
}

/// Every submission, denormalized with user/club/workshop display data.
async fn list_submissions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AdminSubmissionRow>>> {
    let submissions = state.db.list_submissions().await?;

    let users: HashMap<String, _> = state
        .db
        .list_users()
        .await?
        .into_iter()
        .map(|u| (u.slack_user_id.clone(), u))
        .collect();

    let clubs: HashMap<String, _> = state
        .db
        .list_clubs()
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();

    let workshops: HashMap<String, _> = state
        .db
        .list_workshops()
        .await?
        .into_iter()
        .map(|w| (w.slug.clone(), w))
        .collect();

    let rows = submissions
        .into_iter()
        .map(|s| {
            let user = users.get(&s.user_id);
            let club_name = user
                .and_then(|u| u.club_id.as_ref())
                .and_then(|id| clubs.get(id))
                .map(|c| c.name.clone());
            let workshop = workshops.get(&s.workshop_slug);

            AdminSubmissionRow {
                id: Submission::doc_id(&s.user_id, &s.workshop_slug),
                user_name: user
                    .map(|u| u.display_name.clone())
                    .unwrap_or_else(|| s.user_id.clone()),
                club_name,
                workshop_title: workshop
                    .map(|w| w.title.clone())
                    .unwrap_or_else(|| s.workshop_slug.clone()),
                workshop_emoji: workshop.map(|w| w.emoji.clone()).unwrap_or_default(),
                user_id: s.user_id,
                workshop_slug: s.workshop_slug,
                event_code: s.event_code,
                photo: s.photo,
                notes: s.notes,
                submitted_at: s.submitted_at,
            }
        })
        .collect();

    Ok(Json(rows))
}

/// One club row for the admin table.
#[derive(Serialize)]
pub struct AdminClubRow {
    pub id: String,
    pub name: String,
    pub join_code: String,
    pub location: Option<String>,
    pub leader_name: String,
    pub member_count: usize,
    pub created_at: String,
}

/// Every club with leader display name and member count.
async fn list_clubs(State(state): State<Arc<AppState>>) -> Result<Json<Vec<AdminClubRow>>> {
    let clubs = state.db.list_clubs().await?;
    let users = state.db.list_users().await?;

    let mut member_counts: HashMap<&str, usize> = HashMap::new();
    for user in &users {
        if let Some(club_id) = &user.club_id {
            *member_counts.entry(club_id.as_str()).or_default() += 1;
        }
    }

    let names: HashMap<&str, &str> = users
        .iter()
        .map(|u| (u.slack_user_id.as_str(), u.display_name.as_str()))
        .collect();

    let rows = clubs
        .iter()
        .map(|c| AdminClubRow {
            id: c.id.clone(),
            name: c.name.clone(),
            join_code: c.join_code.clone(),
            location: c.location.clone(),
            leader_name: names
                .get(c.created_by.as_str())
                .map(|n| n.to_string())
                .unwrap_or_else(|| c.created_by.clone()),
            member_count: member_counts.get(c.id.as_str()).copied().unwrap_or(0),
            created_at: c.created_at.clone(),
        })
        .collect();

    Ok(Json(rows))
}

// ─── Workshop Provisioning ───────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct WorkshopRequest {
    #[validate(length(min = 1, message = "Workshop slug must not be empty"))]
    pub slug: String,
    #[validate(length(min = 1, message = "Workshop title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub description: String,
    /// `"global"` or a club join code; defaults to global
    #[serde(default = "default_scope")]
    pub scope: String,
}

fn default_scope() -> String {
    workshop::SCOPE_GLOBAL.to_string()
}

/// Create or update a workshop definition (upsert keyed by slug).
async fn upsert_workshop(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WorkshopRequest>,
) -> Result<Json<Workshop>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let workshop = Workshop {
        slug: req.slug.trim().to_string(),
        title: req.title.trim().to_string(),
        emoji: req.emoji,
        description: req.description,
        scope: req.scope.trim().to_string(),
    };

    state.db.upsert_workshop(&workshop).await?;

    tracing::info!(slug = %workshop.slug, scope = %workshop.scope, "Workshop upserted");

    Ok(Json(workshop))
}

// ─── Deletion ────────────────────────────────────────────────

/// Hard-delete a submission by its composite ID.
async fn delete_submission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .db
        .get_submission_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Submission {}", id)))?;

    state.db.delete_submission(&id).await?;

    tracing::info!(submission = %id, "Submission deleted by admin");

    Ok(StatusCode::NO_CONTENT)
}

/// Hard-delete a club; its members are detached, their submissions kept.
async fn delete_club(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .db
        .get_club(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Club {}", id)))?;

    state.db.delete_club(&id).await?;

    tracing::info!(club = %id, "Club deleted by admin");

    Ok(StatusCode::NO_CONTENT)
}
