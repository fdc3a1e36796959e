// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

use food_passport::config::Config;
use food_passport::db::FirestoreDb;
use food_passport::routes::create_router;
use food_passport::services::{PhotoStore, SlackClient};
use food_passport::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Photo store rooted in a throwaway directory.
#[allow(dead_code)]
pub fn test_photo_store() -> PhotoStore {
    let dir = std::env::temp_dir().join(format!("food-passport-test-{}", uuid::Uuid::new_v4()));
    PhotoStore::new(dir).expect("Failed to create test upload dir")
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_frontend_url("http://localhost:5173")
}

/// Same, with a specific frontend URL (drives cookie `Secure` flags).
#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(frontend_url: &str) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();

    let db = test_db_offline();
    let photos = test_photo_store();
    let slack = SlackClient::new(
        config.slack_client_id.clone(),
        config.slack_client_secret.clone(),
    );

    let state = Arc::new(AppState {
        config,
        db,
        slack,
        photos,
    });

    (create_router(state.clone()), state)
}
