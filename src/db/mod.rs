//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const CLUBS: &str = "clubs";
    pub const WORKSHOPS: &str = "workshops";
    /// Per-(user, workshop) completion records, keyed `{user}_{slug}`
    pub const SUBMISSIONS: &str = "submissions";
}
