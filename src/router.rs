use std::path::PathBuf;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    AppState,
    middleware::{log_errors, route_gate},
    routes,
};

// Auth routes are public; each handler checks cookies itself.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/callback", post(routes::auth::callback))
        .route("/api/auth/signout", post(routes::auth::sign_out))
        .route("/api/auth/session", get(routes::auth::session_info))
}

pub fn proxy_routes(max_body_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/api/n8n",
        post(routes::proxy::forward).layer(DefaultBodyLimit::max(max_body_bytes)),
    )
}

/// Full application: API routes, static dashboard assets behind the route
/// gate, error logging and request tracing.
pub fn create_router(state: AppState) -> Router {
    let static_dir = PathBuf::from(&state.config.static_dir);

    Router::new()
        .route("/api/health", get(routes::health::health))
        .merge(auth_routes())
        .merge(proxy_routes(state.config.proxy_max_body_bytes))
        .route_service("/login", ServeFile::new(static_dir.join("login.html")))
        .fallback_service(ServeDir::new(&static_dir).append_index_html_on_directories(true))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            route_gate,
        ))
        .layer(axum::middleware::from_fn(log_errors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
