// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! Submission endpoint validation tests.
//!
//! The multipart field checks run before any database access, so the
//! 400 paths are fully testable against the offline mock DB.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use food_passport::middleware::auth::create_session_token;
use tower::ServiceExt;

mod common;

const BOUNDARY: &str = "X-FOOD-PASSPORT-TEST-BOUNDARY";

/// Build a multipart body from (name, filename, content_type, value) parts.
fn multipart_body(parts: &[(&str, Option<&str>, Option<&str>, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, filename, content_type, value) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match filename {
            Some(f) => body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    name, f
                )
                .as_bytes(),
            ),
            None => body.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"\r\n", name).as_bytes(),
            ),
        }
        if let Some(ct) = content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", ct).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

async fn post_submission(
    app: axum::Router,
    token: Option<&str>,
    parts: &[(&str, Option<&str>, Option<&str>, &[u8])],
) -> StatusCode {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/submissions")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        );
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("session={}", token));
    }

    let response = app
        .oneshot(builder.body(Body::from(multipart_body(parts))).unwrap())
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn test_submission_requires_authentication() {
    let (app, _) = common::create_test_app();

    let status = post_submission(
        app,
        None,
        &[("eventCode", None, None, b"GLAZE-123".as_slice())],
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_submission_missing_event_code_rejected() {
    let (app, state) = common::create_test_app();
    let token = create_session_token("U042ORPHEUS", &state.config.session_signing_key).unwrap();

    let status = post_submission(
        app,
        Some(&token),
        &[
            ("workshopSlug", None, None, b"glaze".as_slice()),
            (
                "photo",
                Some("proof.jpg"),
                Some("image/jpeg"),
                b"fake-jpeg-bytes".as_slice(),
            ),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submission_blank_event_code_rejected() {
    let (app, state) = common::create_test_app();
    let token = create_session_token("U042ORPHEUS", &state.config.session_signing_key).unwrap();

    let status = post_submission(
        app,
        Some(&token),
        &[
            ("eventCode", None, None, b"   ".as_slice()),
            ("workshopSlug", None, None, b"glaze".as_slice()),
            (
                "photo",
                Some("proof.jpg"),
                Some("image/jpeg"),
                b"fake-jpeg-bytes".as_slice(),
            ),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submission_missing_photo_rejected() {
    let (app, state) = common::create_test_app();
    let token = create_session_token("U042ORPHEUS", &state.config.session_signing_key).unwrap();

    let status = post_submission(
        app,
        Some(&token),
        &[
            ("eventCode", None, None, b"GLAZE-123".as_slice()),
            ("workshopSlug", None, None, b"glaze".as_slice()),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submission_empty_photo_rejected() {
    let (app, state) = common::create_test_app();
    let token = create_session_token("U042ORPHEUS", &state.config.session_signing_key).unwrap();

    let status = post_submission(
        app,
        Some(&token),
        &[
            ("eventCode", None, None, b"GLAZE-123".as_slice()),
            ("workshopSlug", None, None, b"glaze".as_slice()),
            (
                "photo",
                Some("proof.jpg"),
                Some("image/jpeg"),
                b"".as_slice(),
            ),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submission_missing_workshop_slug_rejected() {
    let (app, state) = common::create_test_app();
    let token = create_session_token("U042ORPHEUS", &state.config.session_signing_key).unwrap();

    let status = post_submission(
        app,
        Some(&token),
        &[
            ("eventCode", None, None, b"GLAZE-123".as_slice()),
            (
                "photo",
                Some("proof.jpg"),
                Some("image/jpeg"),
                b"fake-jpeg-bytes".as_slice(),
            ),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submission_ignores_display_only_fields() {
    let (app, state) = common::create_test_app();
    let token = create_session_token("U042ORPHEUS", &state.config.session_signing_key).unwrap();

    // clubName/leaderName carry no authority and must not affect
    // validation: with the required fields absent this is still a 400,
    // not a 500 from trying to honor them.
    let status = post_submission(
        app,
        Some(&token),
        &[
            ("clubName", None, None, b"Coding Chefs".as_slice()),
            ("leaderName", None, None, b"Orpheus".as_slice()),
        ],
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}
