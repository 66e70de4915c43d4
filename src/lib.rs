use config::Config;
use infrastructure::auth::AuthClient;
use session::CookieCodec;
use std::sync::Arc;

pub mod common;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod middleware;
pub mod router;
pub mod session;
pub mod upstream;

pub mod routes;

/// Shared, read-only request context. Clients are injected here instead of
/// living in module-level singletons.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub http: reqwest::Client,
    pub auth: AuthClient,
    pub cookies: CookieCodec,
}

impl AppState {
    pub fn new(config: Config, http: reqwest::Client) -> Self {
        let config = Arc::new(config);
        let auth = AuthClient::new(http.clone(), config.auth.clone());
        let cookies = CookieCodec::from_config(&config.session);
        Self {
            config,
            http,
            auth,
            cookies,
        }
    }
}
