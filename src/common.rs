use serde::{Deserialize, Serialize};

/// Body returned by endpoints whose only observable effect is on cookies.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}
