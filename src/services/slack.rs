// SPDX-License-Identifier: MIT
// Copyright 2026 Hack Club <team@hackclub.com>

//! Slack OAuth client: authorization-code exchange and identity fetch.
//!
//! Slack reports failures two ways: transport-level non-2xx statuses and
//! an `ok: false` + `error` envelope inside a 200. Both collapse into
//! [`SlackAuthError`] here; raw reqwest errors never leave this module.

use crate::error::AppError;
use serde::Deserialize;
use std::time::Duration;

/// Upper bound on each Slack call. Without it a wedged upstream would
/// hold the callback request open indefinitely.
const SLACK_TIMEOUT_SECS: u64 = 10;

/// User identity scopes requested during authorization.
const USER_SCOPES: &str = "identity.basic,identity.email,identity.avatar";

/// Failure modes of the OAuth completion flow.
///
/// `reason_code()` yields the machine-readable string the login page
/// receives in its `error` query parameter.
#[derive(Debug, thiserror::Error)]
pub enum SlackAuthError {
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Slack rejected the code exchange: {0}")]
    ExchangeRejected(String),

    #[error("Token response contained no user access token")]
    MissingToken,

    #[error("Identity fetch failed: {0}")]
    IdentityFetchFailed(String),

    #[error("Slack rejected the identity fetch: {0}")]
    IdentityRejected(String),

    #[error("Identity response lacked a stable user id")]
    InvalidIdentity,
}

impl SlackAuthError {
    /// Machine-readable reason for login-page redirects.
    pub fn reason_code(&self) -> String {
        match self {
            SlackAuthError::TokenExchangeFailed(_) => "token_exchange_failed".to_string(),
            SlackAuthError::ExchangeRejected(err) => format!("slack_{}", err),
            SlackAuthError::MissingToken => "missing_token".to_string(),
            SlackAuthError::IdentityFetchFailed(_) => "user_fetch_failed".to_string(),
            SlackAuthError::IdentityRejected(err) => format!("identity_{}", err),
            SlackAuthError::InvalidIdentity => "invalid_user_data".to_string(),
        }
    }
}

impl From<SlackAuthError> for AppError {
    fn from(err: SlackAuthError) -> Self {
        AppError::SlackApi(err.to_string())
    }
}

/// Normalized external identity, independent of Slack's response shape.
#[derive(Debug, Clone)]
pub struct SlackProfile {
    pub slack_user_id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Slack OAuth client.
#[derive(Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    authorize_base: String,
    api_base: String,
    client_id: String,
    client_secret: String,
}

impl SlackClient {
    /// Create a new Slack client with OAuth credentials.
    pub fn new(client_id: String, client_secret: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(SLACK_TIMEOUT_SECS))
            .build()
            .expect("failed to build Slack HTTP client");

        Self {
            http,
            authorize_base: "https://slack.com/oauth/v2/authorize".to_string(),
            api_base: "https://slack.com/api".to_string(),
            client_id,
            client_secret,
        }
    }

    /// Build the provider authorize URL for the browser redirect.
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> String {
        format!(
            "{}?client_id={}&user_scope={}&redirect_uri={}&state={}",
            self.authorize_base,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(USER_SCOPES),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for a user access token.
    ///
    /// Codes are single-use at the provider; a second exchange of the same
    /// code comes back as an `ok: false` envelope.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, SlackAuthError> {
        let url = format!("{}/oauth.v2.access", self.api_base);

        let response = self
            .http
            .post(&url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| SlackAuthError::TokenExchangeFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SlackAuthError::TokenExchangeFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: OAuthAccessResponse = response
            .json()
            .await
            .map_err(|e| SlackAuthError::TokenExchangeFailed(e.to_string()))?;

        if !body.ok {
            return Err(SlackAuthError::ExchangeRejected(
                body.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        body.authed_user
            .and_then(|u| u.access_token)
            .filter(|t| !t.is_empty())
            .ok_or(SlackAuthError::MissingToken)
    }

    /// Fetch the authenticated user's identity and normalize it.
    pub async fn fetch_identity(&self, access_token: &str) -> Result<SlackProfile, SlackAuthError> {
        let url = format!("{}/users.identity", self.api_base);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| SlackAuthError::IdentityFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SlackAuthError::IdentityFetchFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let body: UsersIdentityResponse = response
            .json()
            .await
            .map_err(|e| SlackAuthError::IdentityFetchFailed(e.to_string()))?;

        if !body.ok {
            return Err(SlackAuthError::IdentityRejected(
                body.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        normalize_identity(body.user.ok_or(SlackAuthError::InvalidIdentity)?)
    }
}

/// Collapse Slack's identity shape into [`SlackProfile`].
fn normalize_identity(user: IdentityUser) -> Result<SlackProfile, SlackAuthError> {
    let slack_user_id = user
        .id
        .filter(|id| !id.is_empty())
        .ok_or(SlackAuthError::InvalidIdentity)?;

    let display_name = [user.real_name, user.name]
        .into_iter()
        .flatten()
        .find(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "Club Leader".to_string());

    let avatar_url = [user.image_512, user.image_192, user.image_72]
        .into_iter()
        .flatten()
        .find(|u| !u.is_empty());

    Ok(SlackProfile {
        slack_user_id,
        display_name,
        email: user.email.filter(|e| !e.is_empty()),
        avatar_url,
    })
}

/// `oauth.v2.access` response envelope.
#[derive(Debug, Deserialize)]
struct OAuthAccessResponse {
    ok: bool,
    error: Option<String>,
    authed_user: Option<AuthedUser>,
}

#[derive(Debug, Deserialize)]
struct AuthedUser {
    access_token: Option<String>,
}

/// `users.identity` response envelope.
#[derive(Debug, Deserialize)]
struct UsersIdentityResponse {
    ok: bool,
    error: Option<String>,
    user: Option<IdentityUser>,
}

#[derive(Debug, Deserialize)]
struct IdentityUser {
    id: Option<String>,
    name: Option<String>,
    real_name: Option<String>,
    email: Option<String>,
    image_512: Option<String>,
    image_192: Option<String>,
    image_72: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: Option<&str>) -> IdentityUser {
        IdentityUser {
            id: id.map(String::from),
            name: Some("orpheus".to_string()),
            real_name: Some("Orpheus the Dino".to_string()),
            email: Some("orpheus@hackclub.com".to_string()),
            image_512: None,
            image_192: Some("https://img.example/192.png".to_string()),
            image_72: Some("https://img.example/72.png".to_string()),
        }
    }

    #[test]
    fn test_normalize_prefers_real_name() {
        let profile = normalize_identity(identity(Some("U042"))).unwrap();
        assert_eq!(profile.slack_user_id, "U042");
        assert_eq!(profile.display_name, "Orpheus the Dino");
    }

    #[test]
    fn test_normalize_falls_back_to_handle_then_literal() {
        let mut user = identity(Some("U042"));
        user.real_name = Some("   ".to_string());
        let profile = normalize_identity(user).unwrap();
        assert_eq!(profile.display_name, "orpheus");

        let mut user = identity(Some("U042"));
        user.real_name = None;
        user.name = None;
        let profile = normalize_identity(user).unwrap();
        assert_eq!(profile.display_name, "Club Leader");
    }

    #[test]
    fn test_normalize_picks_largest_avatar() {
        let profile = normalize_identity(identity(Some("U042"))).unwrap();
        assert_eq!(
            profile.avatar_url.as_deref(),
            Some("https://img.example/192.png")
        );

        let mut user = identity(Some("U042"));
        user.image_512 = Some("https://img.example/512.png".to_string());
        let profile = normalize_identity(user).unwrap();
        assert_eq!(
            profile.avatar_url.as_deref(),
            Some("https://img.example/512.png")
        );
    }

    #[test]
    fn test_normalize_rejects_missing_id() {
        assert!(matches!(
            normalize_identity(identity(None)),
            Err(SlackAuthError::InvalidIdentity)
        ));
        assert!(matches!(
            normalize_identity(identity(Some(""))),
            Err(SlackAuthError::InvalidIdentity)
        ));
    }

    #[test]
    fn test_reason_codes_match_login_page_contract() {
        assert_eq!(
            SlackAuthError::TokenExchangeFailed("x".into()).reason_code(),
            "token_exchange_failed"
        );
        assert_eq!(
            SlackAuthError::ExchangeRejected("invalid_code".into()).reason_code(),
            "slack_invalid_code"
        );
        assert_eq!(SlackAuthError::MissingToken.reason_code(), "missing_token");
        assert_eq!(
            SlackAuthError::IdentityRejected("account_inactive".into()).reason_code(),
            "identity_account_inactive"
        );
        assert_eq!(
            SlackAuthError::InvalidIdentity.reason_code(),
            "invalid_user_data"
        );
    }

    #[test]
    fn test_authorize_url_encodes_params() {
        let client = SlackClient::new("CID".to_string(), "SECRET".to_string());
        let url = client.authorize_url("http://localhost:8080/auth/slack/callback", "abc|123");

        assert!(url.starts_with("https://slack.com/oauth/v2/authorize?"));
        assert!(url.contains("client_id=CID"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fslack%2Fcallback"));
        assert!(url.contains("state=abc%7C123"));
        assert!(url.contains("user_scope=identity.basic%2Cidentity.email%2Cidentity.avatar"));
    }
}
