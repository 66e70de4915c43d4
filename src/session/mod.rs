mod codec;

pub use codec::{CookieCodec, CookieEncoding, MAX_CHUNK_SIZE};

use serde::{Deserialize, Serialize};

/// Token pair issued by the auth provider. Only the two tokens are required;
/// the rest is carried through when the provider returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<serde_json::Value>,
}

impl Session {
    pub fn from_tokens(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: None,
            expires_in: None,
            expires_at: None,
            user: None,
        }
    }
}
