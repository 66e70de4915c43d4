use serde::{Deserialize, Serialize};

use crate::session::Session;

/// Body posted by the browser after a client-side auth state change.
/// Every field is optional so malformed payloads degrade to a no-op.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackRequest {
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub session: Option<SessionPayload>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SessionPayload {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl CallbackRequest {
    pub fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    pub fn into_session(self) -> Option<Session> {
        let payload = self.session?;
        let access_token = payload.access_token.filter(|t| !t.is_empty())?;
        Some(Session::from_tokens(
            access_token,
            payload.refresh_token.unwrap_or_default(),
        ))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfoResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub expires_at: i64,
}
