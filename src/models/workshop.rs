// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! Workshop model and visibility scoping.

use serde::{Deserialize, Serialize};

/// Scope value meaning "visible to every club".
pub const SCOPE_GLOBAL: &str = "global";

/// Workshop definition stored in Firestore (document ID = `slug`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workshop {
    /// URL-safe identifier, also the document ID (e.g. `glaze`)
    pub slug: String,
    pub title: String,
    /// Emoji glyph shown in the passport UI
    pub emoji: String,
    pub description: String,
    /// `"global"`, or a club join code restricting visibility
    pub scope: String,
}

impl Workshop {
    /// Whether this workshop is visible to a member of the club with the
    /// given join code (or to a user with no club at all).
    pub fn is_visible_to(&self, club_join_code: Option<&str>) -> bool {
        self.scope == SCOPE_GLOBAL || Some(self.scope.as_str()) == club_join_code
    }
}
