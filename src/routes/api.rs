// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{club, Club, Role, Submission, User};
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

/// API routes (require authentication via the session middleware).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/clubs", post(create_club))
        .route("/api/clubs/join", post(join_club))
        .route("/api/workshops", get(list_workshops))
        .route("/api/submissions", post(submit_workshop))
}

// ─── User Profile ────────────────────────────────────────────

/// Club display fields embedded in responses.
#[derive(Serialize)]
pub struct ClubResponse {
    pub id: String,
    pub name: String,
    pub join_code: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl From<Club> for ClubResponse {
    fn from(club: Club) -> Self {
        Self {
            id: club.id,
            name: club.name,
            join_code: club.join_code,
            location: club.location,
            description: club.description,
        }
    }
}

/// Current user response.
#[derive(Serialize)]
pub struct ProfileResponse {
    pub slack_user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub club: Option<ClubResponse>,
}

/// Get current user profile joined with their club.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = fetch_user(&state, &user.user_id).await?;

    let club = match &profile.club_id {
        Some(club_id) => state.db.get_club(club_id).await?.map(ClubResponse::from),
        None => None,
    };

    Ok(Json(ProfileResponse {
        slack_user_id: profile.slack_user_id,
        display_name: profile.display_name,
        email: profile.email,
        avatar_url: profile.avatar_url,
        role: profile.role,
        club,
    }))
}

// ─── Clubs ───────────────────────────────────────────────────

#[derive(Deserialize, Validate)]
pub struct CreateClubRequest {
    #[validate(length(min = 1, message = "Club name must not be empty"))]
    pub name: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Create a club and bind the caller as its leader, atomically.
async fn create_club(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<CreateClubRequest>,
) -> Result<Json<ClubResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest(
            "Club name must not be empty".to_string(),
        ));
    }

    let new_club = Club {
        id: uuid::Uuid::new_v4().to_string(),
        name,
        join_code: club::generate_join_code(),
        location: req.location.filter(|l| !l.trim().is_empty()),
        description: req.description.filter(|d| !d.trim().is_empty()),
        created_by: user.user_id.clone(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    let (created, _) = state.db.create_club_for_user(new_club, &user.user_id).await?;

    Ok(Json(created.into()))
}

#[derive(Deserialize, Validate)]
pub struct JoinClubRequest {
    #[validate(length(min = 1, message = "Join code must not be empty"))]
    pub join_code: String,
}

/// Join an existing club by its shareable code. Idempotent.
async fn join_club(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<JoinClubRequest>,
) -> Result<Json<ClubResponse>> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let club = state
        .db
        .find_club_by_join_code(req.join_code.trim())
        .await?
        .ok_or_else(|| AppError::NotFound("No club with that join code".to_string()))?;

    state
        .db
        .set_user_club(&user.user_id, Some(club.id.clone()))
        .await?;

    tracing::info!(user = %user.user_id, club = %club.id, "User joined club");

    Ok(Json(club.into()))
}

// ─── Workshops ───────────────────────────────────────────────

/// One workshop with the caller's own completion state merged in.
#[derive(Serialize)]
pub struct WorkshopStatusResponse {
    pub slug: String,
    pub title: String,
    pub emoji: String,
    pub description: String,
    pub completed: bool,
    pub submitted_at: Option<String>,
}

/// List workshops visible to the caller (global plus their club's),
/// annotated with their own submissions.
async fn list_workshops(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<WorkshopStatusResponse>>> {
    let profile = fetch_user(&state, &user.user_id).await?;

    let join_code = match &profile.club_id {
        Some(club_id) => state.db.get_club(club_id).await?.map(|c| c.join_code),
        None => None,
    };

    let workshops = state.db.list_visible_workshops(join_code.as_deref()).await?;

    let submissions: HashMap<String, Submission> = state
        .db
        .list_submissions_for_user(&user.user_id)
        .await?
        .into_iter()
        .map(|s| (s.workshop_slug.clone(), s))
        .collect();

    let response = workshops
        .into_iter()
        .map(|w| {
            let submission = submissions.get(&w.slug);
            WorkshopStatusResponse {
                slug: w.slug,
                title: w.title,
                emoji: w.emoji,
                description: w.description,
                completed: submission.map(|s| s.completed).unwrap_or(false),
                submitted_at: submission.map(|s| s.submitted_at.clone()),
            }
        })
        .collect();

    Ok(Json(response))
}

// ─── Submissions ─────────────────────────────────────────────

/// Stored submission, as returned to the submitter.
#[derive(Serialize)]
pub struct SubmissionResponse {
    pub workshop_slug: String,
    pub completed: bool,
    pub event_code: String,
    pub photo: Option<String>,
    pub notes: Option<String>,
    pub submitted_at: String,
}

impl From<Submission> for SubmissionResponse {
    fn from(s: Submission) -> Self {
        Self {
            workshop_slug: s.workshop_slug,
            completed: s.completed,
            event_code: s.event_code,
            photo: s.photo,
            notes: s.notes,
            submitted_at: s.submitted_at,
        }
    }
}

/// Submit proof for a workshop: multipart form with `eventCode`,
/// `photo`, `workshopSlug`, and optional `notes`.
///
/// Upserts the (user, workshop) record: re-submitting overwrites the
/// prior attempt, so there is never more than one row per pair. The
/// event code is stored as opaque text for manual admin verification.
async fn submit_workshop(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<SubmissionResponse>> {
    let mut event_code: Option<String> = None;
    let mut workshop_slug: Option<String> = None;
    let mut notes: Option<String> = None;
    let mut photo: Option<(Option<String>, Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "eventCode" => {
                event_code = Some(read_text_field(field).await?);
            }
            "workshopSlug" | "workshopId" => {
                workshop_slug = Some(read_text_field(field).await?);
            }
            "notes" => {
                notes = Some(read_text_field(field).await?);
            }
            "photo" => {
                let content_type = field.content_type().map(str::to_string);
                let file_name = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read photo: {}", e)))?;
                photo = Some((content_type, file_name, bytes.to_vec()));
            }
            // Display-only fields (clubName, leaderName) are ignored;
            // they carry no authority.
            _ => {}
        }
    }

    let event_code = event_code
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("eventCode is required".to_string()))?;

    let workshop_slug = workshop_slug
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::BadRequest("workshopSlug is required".to_string()))?;

    let (content_type, file_name, photo_bytes) = photo
        .filter(|(_, _, bytes)| !bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("photo is required".to_string()))?;

    let workshop = state
        .db
        .get_workshop(&workshop_slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Workshop {}", workshop_slug)))?;

    let photo_ref = state
        .photos
        .save(content_type.as_deref(), file_name.as_deref(), &photo_bytes)
        .await?;

    let submission = Submission {
        user_id: user.user_id.clone(),
        workshop_slug: workshop.slug.clone(),
        completed: true,
        event_code,
        photo: Some(photo_ref),
        notes: notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        submitted_at: chrono::Utc::now().to_rfc3339(),
    };

    state.db.upsert_submission(&submission).await?;

    tracing::info!(
        user = %user.user_id,
        workshop = %workshop.slug,
        "Workshop submission recorded"
    );

    Ok(Json(submission.into()))
}

/// Read one text field out of the multipart stream.
async fn read_text_field(field: axum::extract::multipart::Field<'_>) -> Result<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart field: {}", e)))
}

/// Resolve the authenticated user id to the directory record; a stale or
/// forged credential that no longer resolves is a 404, not a 500.
async fn fetch_user(state: &Arc<AppState>, user_id: &str) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
}
