use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::config::AuthConfig;
use crate::session::Session;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("auth provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("auth provider rejected the request with status {0}")]
    Rejected(StatusCode),
}

/// Why a cookie session could not be used.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("access token rejected: {0}")]
    InvalidToken(jsonwebtoken::errors::Error),
    #[error("session refresh failed: {0}")]
    Refresh(AuthError),
}

impl SessionError {
    /// True when the stored session can never become valid again, so its
    /// cookies should be expired. A provider outage is not.
    pub fn is_revoked(&self) -> bool {
        match self {
            SessionError::InvalidToken(_) => true,
            SessionError::Refresh(AuthError::Rejected(_)) => true,
            SessionError::Refresh(AuthError::Transport(_)) => false,
        }
    }
}

pub fn verify_token(token: &str, config: &AuthConfig) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[config.jwt_audience.as_str()]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

/// A session whose access token verified, possibly after a refresh.
#[derive(Debug, Clone)]
pub struct ResolvedSession {
    pub session: Session,
    pub claims: Claims,
    pub refreshed: bool,
}

/// Thin client for the hosted auth provider's REST endpoints.
#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    config: AuthConfig,
}

impl AuthClient {
    pub fn new(http: reqwest::Client, config: AuthConfig) -> Self {
        Self { http, config }
    }

    /// Verifies the access token, refreshing it once when it has only
    /// expired.
    pub async fn resolve(&self, session: Session) -> Result<ResolvedSession, SessionError> {
        let expired = match verify_token(&session.access_token, &self.config) {
            Ok(claims) => {
                return Ok(ResolvedSession {
                    session,
                    claims,
                    refreshed: false,
                });
            }
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => e,
            Err(e) => {
                tracing::debug!("Rejecting session: {}", e);
                return Err(SessionError::InvalidToken(e));
            }
        };

        if session.refresh_token.is_empty() {
            return Err(SessionError::InvalidToken(expired));
        }
        tracing::debug!("Access token expired, refreshing session");
        let refreshed = self.refresh(&session.refresh_token).await.map_err(|e| {
            tracing::warn!("Session refresh failed: {}", e);
            SessionError::Refresh(e)
        })?;

        match verify_token(&refreshed.access_token, &self.config) {
            Ok(claims) => Ok(ResolvedSession {
                session: refreshed,
                claims,
                refreshed: true,
            }),
            Err(e) => {
                tracing::warn!("Refreshed access token failed verification: {}", e);
                Err(SessionError::InvalidToken(e))
            }
        }
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let url = format!("{}/auth/v1/token?grant_type=refresh_token", self.config.url);
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AuthError::Rejected(resp.status()));
        }
        Ok(resp.json::<Session>().await?)
    }

    pub async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let url = format!("{}/auth/v1/logout", self.config.url);
        let resp = self
            .http
            .post(url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AuthError::Rejected(resp.status()));
        }
        Ok(())
    }
}
