use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use reqwest::Url;

use crate::AppState;

pub const LOGIN_PATH: &str = "/login";

/// Prefixes reachable without a session, whatever the session state.
const PUBLIC_PREFIXES: [&str; 6] = [
    "/_next",
    "/favicon",
    "/assets",
    "/api/health",
    "/api/auth",
    "/api/n8n",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectToLogin,
    RedirectToHome,
}

pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
}

pub fn decide(path: &str, authenticated: bool) -> GateDecision {
    if is_public_path(path) {
        return GateDecision::Allow;
    }
    if path == LOGIN_PATH {
        return if authenticated {
            GateDecision::RedirectToHome
        } else {
            GateDecision::Allow
        };
    }
    if authenticated {
        GateDecision::Allow
    } else {
        GateDecision::RedirectToLogin
    }
}

/// `/login?redirect=<path>` with the path form-encoded.
pub fn login_location(path: &str) -> String {
    match Url::parse_with_params("http://gate.local/login", &[("redirect", path)]) {
        Ok(url) => format!("{}?{}", url.path(), url.query().unwrap_or_default()),
        Err(_) => LOGIN_PATH.to_string(),
    }
}

fn append_cookies(mut response: Response, cookies: Vec<Cookie<'static>>) -> Response {
    for cookie in cookies {
        match HeaderValue::from_str(&cookie.encoded().to_string()) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::error!("Session cookie is not a valid header: {}", e),
        }
    }
    response
}

pub async fn route_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    if is_public_path(&path) {
        return next.run(request).await;
    }

    let jar = CookieJar::from_headers(request.headers());
    let (resolved, revoked) = match state.cookies.read(&jar) {
        Some(session) => match state.auth.resolve(session).await {
            Ok(resolved) => (Some(resolved), false),
            Err(e) => (None, e.is_revoked()),
        },
        None => (None, false),
    };

    let decision = decide(&path, resolved.is_some());
    tracing::debug!("route_gate: {} -> {:?}", path, decision);

    let response = match decision {
        GateDecision::Allow => next.run(request).await,
        GateDecision::RedirectToHome => Redirect::temporary("/").into_response(),
        GateDecision::RedirectToLogin => {
            tracing::info!("Unauthenticated access to {}, redirecting to login", path);
            Redirect::temporary(&login_location(&path)).into_response()
        }
    };

    match resolved {
        Some(resolved) if resolved.refreshed => {
            append_cookies(response, state.cookies.write_cookies(&jar, &resolved.session))
        }
        None if revoked => {
            tracing::info!("Expiring revoked session cookies");
            append_cookies(response, state.cookies.clear_cookies(&jar))
        }
        _ => response,
    }
}
