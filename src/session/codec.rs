use std::str::FromStr;

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

use crate::config::SessionConfig;

use super::Session;

/// Largest value stored in one cookie before the session is split into
/// numbered chunks.
pub const MAX_CHUNK_SIZE: usize = 3180;

const BASE64_PREFIX: &str = "base64-";

/// How the serialized session is written into cookie values. The bridge,
/// sign-out and the route gate all go through the same [`CookieCodec`], so
/// changing this is a single configuration switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CookieEncoding {
    Raw,
    #[default]
    Base64Url,
}

impl FromStr for CookieEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(CookieEncoding::Raw),
            "base64url" => Ok(CookieEncoding::Base64Url),
            other => Err(format!("unknown cookie encoding `{}`", other)),
        }
    }
}

impl CookieEncoding {
    pub fn encode(self, json: &str) -> String {
        match self {
            CookieEncoding::Raw => json.to_string(),
            CookieEncoding::Base64Url => {
                format!("{}{}", BASE64_PREFIX, URL_SAFE_NO_PAD.encode(json))
            }
        }
    }

    pub fn decode(self, value: &str) -> Option<String> {
        match self {
            CookieEncoding::Raw => Some(value.to_string()),
            CookieEncoding::Base64Url => {
                let payload = value.strip_prefix(BASE64_PREFIX)?;
                let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
                String::from_utf8(bytes).ok()
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct CookieCodec {
    name: String,
    encoding: CookieEncoding,
    secure: bool,
    max_age: time::Duration,
}

impl CookieCodec {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            encoding: config.encoding,
            secure: config.secure,
            max_age: time::Duration::days(config.max_age_days),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn chunk_name(&self, index: usize) -> String {
        format!("{}.{}", self.name, index)
    }

    /// Chunk indices carried by the request, in ascending order.
    fn chunk_indices(&self, jar: &CookieJar) -> Vec<usize> {
        let prefix = format!("{}.", self.name);
        let mut indices: Vec<usize> = jar
            .iter()
            .filter_map(|c| c.name().strip_prefix(prefix.as_str())?.parse().ok())
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Reassembles the raw cookie value, preferring the unchunked cookie.
    fn read_value(&self, jar: &CookieJar) -> Option<String> {
        if let Some(cookie) = jar.get(&self.name) {
            return Some(cookie.value().to_string());
        }

        let mut value = String::new();
        let mut index = 0;
        while let Some(chunk) = jar.get(&self.chunk_name(index)) {
            value.push_str(chunk.value());
            index += 1;
        }
        (index > 0).then_some(value)
    }

    pub fn read(&self, jar: &CookieJar) -> Option<Session> {
        let raw = self.read_value(jar)?;
        let json = self.encoding.decode(&raw)?;
        match serde_json::from_str(&json) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!("Ignoring undecodable session cookie: {}", e);
                None
            }
        }
    }

    fn build(&self, name: String, value: String) -> Cookie<'static> {
        Cookie::build((name, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(self.max_age)
            .build()
    }

    fn expired(name: String) -> Cookie<'static> {
        Cookie::build((name, ""))
            .path("/")
            .max_age(time::Duration::ZERO)
            .build()
    }

    /// Cookies that persist `session`, followed by expirations for any
    /// variants the request carried that the new value no longer uses.
    pub fn write_cookies(&self, jar: &CookieJar, session: &Session) -> Vec<Cookie<'static>> {
        let json = match serde_json::to_string(session) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize session: {}", e);
                return Vec::new();
            }
        };
        let value = self.encoding.encode(&json);
        let existing = self.chunk_indices(jar);

        if value.len() <= MAX_CHUNK_SIZE {
            let mut cookies = vec![self.build(self.name.clone(), value)];
            cookies.extend(existing.into_iter().map(|i| Self::expired(self.chunk_name(i))));
            return cookies;
        }

        let chunks = split_chunks(&value, MAX_CHUNK_SIZE);
        let used = chunks.len();
        let mut cookies: Vec<Cookie<'static>> = chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| self.build(self.chunk_name(i), chunk.to_string()))
            .collect();
        if jar.get(&self.name).is_some() {
            cookies.push(Self::expired(self.name.clone()));
        }
        cookies.extend(
            existing
                .into_iter()
                .filter(|i| *i >= used)
                .map(|i| Self::expired(self.chunk_name(i))),
        );
        cookies
    }

    /// Expirations for the base cookie, every chunk on the request, and the
    /// first two chunk names even when the request did not send them.
    pub fn clear_cookies(&self, jar: &CookieJar) -> Vec<Cookie<'static>> {
        let mut indices = self.chunk_indices(jar);
        indices.extend([0, 1]);
        indices.sort_unstable();
        indices.dedup();

        std::iter::once(Self::expired(self.name.clone()))
            .chain(indices.into_iter().map(|i| Self::expired(self.chunk_name(i))))
            .collect()
    }

    pub fn write(&self, jar: CookieJar, session: &Session) -> CookieJar {
        self.write_cookies(&jar, session)
            .into_iter()
            .fold(jar, |jar, cookie| jar.add(cookie))
    }

    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        self.clear_cookies(&jar)
            .into_iter()
            .fold(jar, |jar, cookie| jar.add(cookie))
    }
}

/// Splits on char boundaries; encoded values are ASCII so chunks are exact.
fn split_chunks(value: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let mut end = size.min(rest.len());
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (head, tail) = rest.split_at(end);
        chunks.push(head);
        rest = tail;
    }
    chunks
}
