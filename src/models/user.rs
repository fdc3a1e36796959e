//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Application role. New users start as `Leader` (the club-creator
/// persona this product is built around).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Leader,
    Admin,
}

/// User profile stored in Firestore.
///
/// The Slack user ID is both the external-identity reference and the
/// document ID; no surrogate key exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Slack user ID (also used as document ID)
    pub slack_user_id: String,
    /// Display name (real name, falling back to the Slack handle)
    pub display_name: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Avatar URL (largest image Slack reports)
    pub avatar_url: Option<String>,
    /// Club this user belongs to, if any
    pub club_id: Option<String>,
    pub role: Role,
    /// When the user first signed in
    pub created_at: String,
    /// Last successful login
    pub last_login: String,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Leader).unwrap(), "\"leader\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"admin\"").unwrap(),
            Role::Admin
        );
    }

    #[test]
    fn test_is_admin() {
        let mut user = User {
            slack_user_id: "U123".to_string(),
            display_name: "Orpheus".to_string(),
            email: None,
            avatar_url: None,
            club_id: None,
            role: Role::Leader,
            created_at: String::new(),
            last_login: String::new(),
        };
        assert!(!user.is_admin());
        user.role = Role::Admin;
        assert!(user.is_admin());
    }
}
