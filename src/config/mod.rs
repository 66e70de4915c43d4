use std::env;

use reqwest::Url;
use thiserror::Error;

use crate::session::CookieEncoding;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub static_dir: String,
    pub proxy_max_body_bytes: usize,
    pub auth: AuthConfig,
    pub session: SessionConfig,
    pub upstream: UpstreamConfig,
}

/// Auth provider endpoints and the material needed to verify its tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub url: String,
    pub anon_key: String,
    pub jwt_secret: String,
    pub jwt_audience: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub encoding: CookieEncoding,
    pub secure: bool,
    pub max_age_days: i64,
}

/// Workflow backend. `base_url` stays optional so a missing value fails
/// individual proxy calls instead of the whole process.
#[derive(Debug, Clone, Default)]
pub struct UpstreamConfig {
    pub base_url: Option<String>,
    pub ingest_path: String,
    pub start_idea_path: String,
    pub update_status_path: String,
    pub transcribe_path: String,
    pub basic_user: String,
    pub basic_pass: String,
}

const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024 * 1024;
/// Browsers cap cookie lifetimes at 400 days.
const MAX_AGE_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=400;

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let auth = AuthConfig {
            url: require("AUTH_URL")?.trim_end_matches('/').to_string(),
            anon_key: require("AUTH_ANON_KEY")?,
            jwt_secret: require("AUTH_JWT_SECRET")?,
            jwt_audience: get("AUTH_JWT_AUDIENCE").unwrap_or_else(|| "authenticated".into()),
        };

        let cookie_name = match get("SESSION_COOKIE_NAME") {
            Some(name) => name,
            None => format!("sb-{}-auth-token", project_ref(&auth.url)?),
        };

        let encoding = match get("SESSION_COOKIE_ENCODING") {
            Some(raw) => raw.parse::<CookieEncoding>().map_err(|reason| ConfigError::Invalid {
                key: "SESSION_COOKIE_ENCODING",
                reason,
            })?,
            None => CookieEncoding::default(),
        };

        let session = SessionConfig {
            cookie_name,
            encoding,
            secure: parse_or(&get, "SESSION_COOKIE_SECURE", false)?,
            max_age_days: max_age_days(&get)?,
        };

        let upstream = UpstreamConfig {
            base_url: get("UPSTREAM_BASE_URL"),
            ingest_path: get("UPSTREAM_INGEST_PATH").unwrap_or_default(),
            start_idea_path: get("UPSTREAM_START_IDEA_PATH").unwrap_or_default(),
            update_status_path: get("UPSTREAM_UPDATE_STATUS_PATH").unwrap_or_default(),
            transcribe_path: get("UPSTREAM_TRANSCRIBE_PATH").unwrap_or_default(),
            basic_user: get("UPSTREAM_BASIC_USER").unwrap_or_default(),
            basic_pass: get("UPSTREAM_BASIC_PASS")
                .or_else(|| get("UPSTREAM_BASIC_PASSWORD"))
                .unwrap_or_default(),
        };

        Ok(Config {
            server_host: get("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or(&get, "SERVER_PORT", 3000)?,
            static_dir: get("STATIC_DIR").unwrap_or_else(|| "public".into()),
            proxy_max_body_bytes: parse_or(&get, "PROXY_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
            auth,
            session,
            upstream,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn max_age_days<G>(get: &G) -> Result<i64, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let days = parse_or(get, "SESSION_COOKIE_MAX_AGE_DAYS", 7)?;
    if !MAX_AGE_DAYS_RANGE.contains(&days) {
        return Err(ConfigError::Invalid {
            key: "SESSION_COOKIE_MAX_AGE_DAYS",
            reason: format!(
                "{} is outside {}..={} days",
                days,
                MAX_AGE_DAYS_RANGE.start(),
                MAX_AGE_DAYS_RANGE.end()
            ),
        });
    }
    Ok(days)
}

/// First label of the provider host, e.g. `abcd` for `https://abcd.supabase.co`.
fn project_ref(auth_url: &str) -> Result<String, ConfigError> {
    let url = Url::parse(auth_url).map_err(|e| ConfigError::Invalid {
        key: "AUTH_URL",
        reason: e.to_string(),
    })?;
    url.host_str()
        .and_then(|host| host.split('.').next())
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .ok_or(ConfigError::Invalid {
            key: "AUTH_URL",
            reason: "no host".into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("AUTH_URL", "https://abcd1234.supabase.co/"),
        ("AUTH_ANON_KEY", "anon"),
        ("AUTH_JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply_when_only_required_keys_are_set() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.auth.url, "https://abcd1234.supabase.co");
        assert_eq!(config.auth.jwt_audience, "authenticated");
        assert_eq!(config.session.cookie_name, "sb-abcd1234-auth-token");
        assert_eq!(config.session.encoding, CookieEncoding::Base64Url);
        assert!(!config.session.secure);
        assert_eq!(config.session.max_age_days, 7);
        assert!(config.upstream.base_url.is_none());
        assert_eq!(config.proxy_max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    }

    #[test]
    fn missing_required_key_is_named() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AUTH_JWT_SECRET")));
    }

    #[test]
    fn basic_password_falls_back_to_long_name() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("UPSTREAM_BASIC_USER", "svc"));
        pairs.push(("UPSTREAM_BASIC_PASSWORD", "hunter2"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.upstream.basic_user, "svc");
        assert_eq!(config.upstream.basic_pass, "hunter2");
    }

    #[test]
    fn empty_values_count_as_unset() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("UPSTREAM_BASE_URL", "  "));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.upstream.base_url.is_none());
    }

    #[test]
    fn rejects_unknown_cookie_encoding() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SESSION_COOKIE_ENCODING", "rot13"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "SESSION_COOKIE_ENCODING",
                ..
            }
        ));
    }

    #[test]
    fn cookie_lifetime_must_be_between_one_and_four_hundred_days() {
        for days in ["0", "-3", "401", "9223372036854775807"] {
            let mut pairs = REQUIRED.to_vec();
            pairs.push(("SESSION_COOKIE_MAX_AGE_DAYS", days));
            let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(
                matches!(
                    err,
                    ConfigError::Invalid {
                        key: "SESSION_COOKIE_MAX_AGE_DAYS",
                        ..
                    }
                ),
                "{}",
                days
            );
        }

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SESSION_COOKIE_MAX_AGE_DAYS", "400"));
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.session.max_age_days, 400);
    }
}
