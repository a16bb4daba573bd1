pub mod keyring;

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest password the signup form accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Refresh sessions that expire within this many seconds.
const EXPIRY_LEEWAY_SECS: i64 = 60;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

/// Tokens for one signed-in user, as handed out by the auth endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: SessionUser,
}

impl Session {
    pub fn is_expired(&self, leeway_secs: i64) -> bool {
        Utc::now() + Duration::seconds(leeway_secs) >= self.expires_at
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    WeakPassword,
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("auth error {status}: {message}")]
    Http { status: u16, message: String },
    #[error("auth request failed: {0}")]
    Transport(String),
    #[error("invalid auth response: {0}")]
    Decode(String),
    #[error("keyring error: {0}")]
    Keyring(String),
}

/// Token grant as the endpoint returns it. `expires_at` (unix seconds) is
/// only sent by newer service versions; `expires_in` always is.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    expires_at: Option<i64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: Uuid,
    email: Option<String>,
}

fn session_from_token(token: TokenResponse) -> Session {
    let expires_at = token
        .expires_at
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .unwrap_or_else(|| Utc::now() + Duration::seconds(token.expires_in));
    Session {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        expires_at,
        user: SessionUser {
            id: token.user.id,
            email: token.user.email.unwrap_or_default(),
        },
    }
}

/// The endpoint has two error body shapes, `{"code":400,"msg":...}` and
/// `{"error":...,"error_description":...}`; read both.
#[derive(Debug, Deserialize)]
struct AuthErrorBody {
    msg: Option<String>,
    error_description: Option<String>,
    error_code: Option<String>,
}

fn parse_auth_error(status: u16, text: &str) -> AuthError {
    let body: Option<AuthErrorBody> = serde_json::from_str(text).ok();
    let message = body
        .as_ref()
        .and_then(|b| b.msg.clone().or_else(|| b.error_description.clone()))
        .unwrap_or_else(|| text.to_string());
    let code = body.and_then(|b| b.error_code);

    if code.as_deref() == Some("invalid_credentials")
        || message.eq_ignore_ascii_case("invalid login credentials")
    {
        return AuthError::InvalidCredentials;
    }
    AuthError::Http { status, message }
}

/// Client for the hosted email/password auth endpoint.
pub struct AuthClient {
    base_url: String,
    anon_key: String,
    http: reqwest::Client,
}

impl AuthClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, AuthError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| AuthError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            http,
        })
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<serde_json::Value, AuthError> {
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Transport(format!("Auth request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(parse_auth_error(status, &text));
        }

        resp.json::<serde_json::Value>()
            .await
            .map_err(|e| AuthError::Decode(format!("Failed to parse auth response: {}", e)))
    }

    fn session_from_value(&self, value: serde_json::Value) -> Result<Session, AuthError> {
        let token: TokenResponse = serde_json::from_value(value)
            .map_err(|e| AuthError::Decode(format!("Failed to parse session: {}", e)))?;
        Ok(session_from_token(token))
    }

    /// Exchange email and password for a session and remember it in the
    /// keyring.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(AuthError::InvalidEmail);
        }

        let url = self.auth_url("token?grant_type=password");
        let body = serde_json::json!({ "email": email, "password": password });
        let value = self.post_json(&url, &body).await?;
        let session = self.session_from_value(value)?;

        if let Err(e) = keyring::store_session(&self.base_url, &session).await {
            log::warn!("Failed to store session in keyring: {}", e);
        }
        log::info!("Signed in as {}", session.user.email);
        Ok(session)
    }

    /// Register a new account. Returns None when the project requires email
    /// confirmation before handing out a session.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>, AuthError> {
        let email = email.trim();
        if !EMAIL_RE.is_match(email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let url = self.auth_url("signup");
        let body = serde_json::json!({ "email": email, "password": password });
        let value = self.post_json(&url, &body).await?;

        if value.get("access_token").is_none() {
            log::info!("Signup for {} awaits email confirmation", email);
            return Ok(None);
        }
        let session = self.session_from_value(value)?;
        if let Err(e) = keyring::store_session(&self.base_url, &session).await {
            log::warn!("Failed to store session in keyring: {}", e);
        }
        Ok(Some(session))
    }

    /// Trade a refresh token for a fresh session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let url = self.auth_url("token?grant_type=refresh_token");
        let body = serde_json::json!({ "refresh_token": refresh_token });
        let value = self.post_json(&url, &body).await?;
        self.session_from_value(value)
    }

    /// Revoke the session server-side (best effort) and clear the keyring.
    pub async fn sign_out(&self, session: &Session) -> Result<(), AuthError> {
        let url = self.auth_url("logout");
        let result = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&session.access_token)
            .send()
            .await;
        match result {
            Ok(resp) if !resp.status().is_success() => {
                log::warn!("Logout returned {}", resp.status());
            }
            Err(e) => log::warn!("Logout request failed: {}", e),
            Ok(_) => {}
        }

        keyring::delete_session(&self.base_url)
            .await
            .map_err(AuthError::Keyring)?;
        log::info!("Signed out");
        Ok(())
    }

    /// Restore the stored session, refreshing it when it is about to lapse.
    /// Ok(None) means nobody is signed in and the caller should show login.
    pub async fn session(&self) -> Result<Option<Session>, AuthError> {
        let stored = keyring::load_session(&self.base_url)
            .await
            .map_err(AuthError::Keyring)?;
        let Some(session) = stored else {
            return Ok(None);
        };

        if !session.is_expired(EXPIRY_LEEWAY_SECS) {
            return Ok(Some(session));
        }

        log::info!("Session expires soon, refreshing");
        match self.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                if let Err(e) = keyring::store_session(&self.base_url, &fresh).await {
                    log::warn!("Failed to store refreshed session: {}", e);
                }
                Ok(Some(fresh))
            }
            Err(AuthError::InvalidCredentials) | Err(AuthError::Http { status: 400 | 401, .. }) => {
                log::info!("Refresh token rejected, clearing stored session");
                if let Err(e) = keyring::delete_session(&self.base_url).await {
                    log::warn!("Failed to clear stale session: {}", e);
                }
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
