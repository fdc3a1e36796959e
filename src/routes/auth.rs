// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! Slack OAuth authentication routes.
//!
//! `GET /auth/slack` plants an anti-forgery nonce cookie and redirects to
//! Slack; `GET /auth/slack/callback` verifies the round-tripped state,
//! exchanges the code, upserts the user, and establishes the session
//! cookie. The nonce is single-use: it is cleared on every callback,
//! success or failure.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::middleware::auth::{create_session_token, SESSION_COOKIE, SESSION_TTL_SECS};
use crate::models::{Role, User};
use crate::services::SlackProfile;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Anti-forgery nonce cookie, scoped to the callback path.
const STATE_COOKIE: &str = "oauth_state";
const STATE_COOKIE_PATH: &str = "/auth/slack/callback";

/// The nonce cookie outlives one authorize round-trip, nothing more.
const STATE_TTL: time::Duration = time::Duration::minutes(5);

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/slack", get(auth_start))
        .route("/auth/slack/callback", get(auth_callback))
        .route("/auth/logout", post(logout))
}

/// Start OAuth flow - plant the nonce cookie and redirect to Slack.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
) -> (CookieJar, Redirect) {
    let mut nonce_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = hex::encode(nonce_bytes);

    let oauth_state = sign_state(&nonce, &state.config.oauth_state_key);
    let callback_url = callback_url_from_headers(&headers);

    let auth_url = state.slack.authorize_url(&callback_url, &oauth_state);

    tracing::info!(
        client_id = %state.config.slack_client_id,
        "Starting OAuth flow, redirecting to Slack"
    );

    let jar = jar.add(state_cookie(&nonce, STATE_TTL, state.config.is_secure()));
    (jar, Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code, create session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
    Query(params): Query<CallbackParams>,
) -> (CookieJar, Redirect) {
    let secure = state.config.is_secure();
    let nonce_cookie = jar.get(STATE_COOKIE).map(|c| c.value().to_string());

    // Nonce is single-use: clear it before anything can fail.
    let jar = jar.add(state_cookie("", time::Duration::ZERO, secure));

    match complete_login(&state, &headers, nonce_cookie.as_deref(), params).await {
        Ok(token) => {
            tracing::info!("OAuth login complete, session established");
            let jar = jar.add(session_cookie(
                &token,
                time::Duration::seconds(SESSION_TTL_SECS as i64),
                secure,
            ));
            (jar, Redirect::temporary(&state.config.frontend_url))
        }
        Err(reason) => {
            tracing::warn!(reason = %reason, "OAuth login failed");
            let redirect = format!(
                "{}/login?error={}",
                state.config.frontend_url,
                urlencoding::encode(&reason)
            );
            (jar, Redirect::temporary(&redirect))
        }
    }
}

/// Run the callback steps, mapping every failure to the machine-readable
/// reason the login page receives.
async fn complete_login(
    state: &Arc<AppState>,
    headers: &axum::http::HeaderMap,
    nonce_cookie: Option<&str>,
    params: CallbackParams,
) -> Result<String, String> {
    if let Some(error) = params.error {
        return Err(format!("slack_{}", error));
    }

    let nonce_cookie = nonce_cookie.ok_or("invalid_state")?;
    let oauth_state = params.state.as_deref().ok_or("invalid_state")?;
    let nonce = verify_state(oauth_state, &state.config.oauth_state_key).ok_or("invalid_state")?;
    if nonce.as_bytes().ct_eq(nonce_cookie.as_bytes()).unwrap_u8() != 1 {
        return Err("invalid_state".to_string());
    }

    let code = params
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or("missing_code")?;

    let callback_url = callback_url_from_headers(headers);

    let access_token = state
        .slack
        .exchange_code(code, &callback_url)
        .await
        .map_err(|e| e.reason_code())?;

    let profile = state
        .slack
        .fetch_identity(&access_token)
        .await
        .map_err(|e| e.reason_code())?;

    let user = upsert_user(state, &profile).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to upsert user after OAuth");
        "internal_error".to_string()
    })?;

    create_session_token(&user.slack_user_id, &state.config.session_signing_key).map_err(|e| {
        tracing::error!(error = %e, "Session token creation failed");
        "internal_error".to_string()
    })
}

/// Insert-or-update the local user for a verified external identity.
///
/// Profile fields are refreshed on every login; role and club membership
/// are preserved. First login creates the user as a leader with no club.
async fn upsert_user(
    state: &Arc<AppState>,
    profile: &SlackProfile,
) -> crate::error::Result<User> {
    let now = chrono::Utc::now().to_rfc3339();

    let user = match state.db.get_user(&profile.slack_user_id).await? {
        Some(mut existing) => {
            existing.display_name = profile.display_name.clone();
            existing.email = profile.email.clone();
            existing.avatar_url = profile.avatar_url.clone();
            existing.last_login = now;
            existing
        }
        None => {
            tracing::info!(slack_user_id = %profile.slack_user_id, "First login, creating user");
            User {
                slack_user_id: profile.slack_user_id.clone(),
                display_name: profile.display_name.clone(),
                email: profile.email.clone(),
                avatar_url: profile.avatar_url.clone(),
                club_id: None,
                role: Role::Leader,
                created_at: now.clone(),
                last_login: now,
            }
        }
    };

    state.db.upsert_user(&user).await?;
    Ok(user)
}

/// Logout - clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let secure = state.config.is_secure();
    let jar = jar
        .add(session_cookie("", time::Duration::ZERO, secure))
        .add(state_cookie("", time::Duration::ZERO, secure));
    (jar, StatusCode::NO_CONTENT)
}

// ─── State signing ───────────────────────────────────────────────

/// Sign `nonce|timestamp_hex` and wrap the whole thing in URL-safe
/// base64 for the `state` query parameter.
fn sign_state(nonce: &str, secret: &[u8]) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    let payload = format!("{}|{:x}", nonce, timestamp);

    // Keyed with the state secret; key length is unconstrained for HMAC
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    URL_SAFE_NO_PAD.encode(signed.as_bytes())
}

/// Verify the signature on a round-tripped state parameter and return
/// the embedded nonce.
fn verify_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    // Format is "nonce|timestamp_hex|signature_hex"
    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }

    let nonce = parts[0];
    let timestamp_hex = parts[1];
    let signature_hex = parts[2];

    let payload = format!("{}|{}", nonce, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if expected
        .as_bytes()
        .ct_eq(signature_hex.as_bytes())
        .unwrap_u8()
        != 1
    {
        tracing::warn!("OAuth state signature mismatch");
        return None;
    }

    Some(nonce.to_string())
}

// ─── Cookie builders ─────────────────────────────────────────────

fn state_cookie(value: &str, max_age: time::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, value.to_string()))
        .path(STATE_COOKIE_PATH)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

fn session_cookie(value: &str, max_age: time::Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Derive the OAuth callback URL from the incoming request's Host.
fn callback_url_from_headers(headers: &axum::http::HeaderMap) -> String {
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost:8080");

    let scheme = if host.contains("localhost") || host.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };

    format!("{}://{}{}", scheme, host, STATE_COOKIE_PATH)
}
