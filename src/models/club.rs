// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! Club model and join-code generation.

use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Length of the random suffix in generated join codes.
const JOIN_CODE_LEN: usize = 6;

/// Club record stored in Firestore (document ID = `id`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Club {
    /// Generated UUID, also the document ID
    pub id: String,
    pub name: String,
    /// Human-shareable code members use to join
    pub join_code: String,
    pub location: Option<String>,
    pub description: Option<String>,
    /// Slack user ID of the creating leader
    pub created_by: String,
    pub created_at: String,
}

/// Generate a shareable join code, e.g. `HC-9X41KQ`.
///
/// Codes are not guaranteed unique by construction; the creation path
/// retries on collision.
pub fn generate_join_code() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(JOIN_CODE_LEN)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("HC-{}", suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_code_shape() {
        let code = generate_join_code();
        assert!(code.starts_with("HC-"));
        assert_eq!(code.len(), 3 + JOIN_CODE_LEN);
        assert!(code[3..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!code[3..].chars().any(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_join_codes_vary() {
        let a = generate_join_code();
        let b = generate_join_code();
        // Astronomically unlikely to collide; a stable sanity check that
        // the generator is not returning a constant.
        assert!(a != b || generate_join_code() != a);
    }
}
