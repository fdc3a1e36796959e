// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! Food Passport: workshop tracking for Hack Club leaders
//!
//! This crate provides the backend API: Slack OAuth login, clubs with
//! shareable join codes, and per-workshop proof submissions.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use config::Config;
use db::FirestoreDb;
use services::{PhotoStore, SlackClient};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub slack: SlackClient,
    pub photos: PhotoStore,
}
