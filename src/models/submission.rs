// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! Workshop submission model.

use serde::{Deserialize, Serialize};

/// Per-(user, workshop) completion record.
///
/// Keyed by [`Submission::doc_id`]; re-submitting the same workshop
/// overwrites the prior record, so at most one exists per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    /// Slack user ID of the submitter
    pub user_id: String,
    /// Workshop slug
    pub workshop_slug: String,
    pub completed: bool,
    /// Event code as entered; opaque text, verified manually by admins
    pub event_code: String,
    /// Stored photo reference (path under the upload root)
    pub photo: Option<String>,
    pub notes: Option<String>,
    /// When this submission was last written (RFC 3339)
    pub submitted_at: String,
}

impl Submission {
    /// Composite document ID for the (user, workshop) pair.
    pub fn doc_id(user_id: &str, workshop_slug: &str) -> String {
        format!("{}_{}", user_id, workshop_slug)
    }
}
