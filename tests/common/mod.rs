#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use insight_gateway::{AppState, config::Config, router::create_router};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

pub const JWT_SECRET: &str = "integration-secret";
pub const COOKIE_NAME: &str = "sb-test-auth-token";

pub fn token(sub: &str, exp_offset: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + exp_offset;
    encode(
        &Header::default(),
        &json!({ "sub": sub, "email": format!("{}@example.com", sub), "aud": "authenticated", "exp": exp }),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn config(auth_url: &str, upstream_base: Option<&str>) -> Config {
    let mut vars: HashMap<&str, String> = HashMap::from([
        ("AUTH_URL", auth_url.to_string()),
        ("AUTH_ANON_KEY", "anon-key".to_string()),
        ("AUTH_JWT_SECRET", JWT_SECRET.to_string()),
        ("SESSION_COOKIE_NAME", COOKIE_NAME.to_string()),
        ("STATIC_DIR", "tests/does-not-exist".to_string()),
        ("UPSTREAM_INGEST_PATH", "/ingest".to_string()),
        ("UPSTREAM_START_IDEA_PATH", "/start".to_string()),
        ("UPSTREAM_UPDATE_STATUS_PATH", "/fail".to_string()),
        ("UPSTREAM_TRANSCRIBE_PATH", "/download".to_string()),
        ("UPSTREAM_BASIC_USER", "svc".to_string()),
        ("UPSTREAM_BASIC_PASS", "pw".to_string()),
    ]);
    if let Some(base) = upstream_base {
        vars.insert("UPSTREAM_BASE_URL", base.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub fn app(config: Config) -> Router {
    create_router(AppState::new(config, reqwest::Client::new()))
}

/// The session cookie exactly as the bridge would write it.
pub fn session_cookie(config: &Config, access_token: &str, refresh_token: &str) -> String {
    let session = json!({ "access_token": access_token, "refresh_token": refresh_token });
    let value = config.session.encoding.encode(&session.to_string());
    format!("{}={}", config.session.cookie_name, value)
}

pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn body_bytes(response: Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

#[derive(Debug, Clone)]
pub struct RecordedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub parts: Vec<RecordedPart>,
}

pub type Calls = Arc<Mutex<Vec<Recorded>>>;

async fn echo_json(
    State(calls): State<Calls>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    calls.lock().unwrap().push(Recorded {
        path: "/start".into(),
        headers,
        body: body.clone(),
        parts: Vec::new(),
    });
    (
        StatusCode::CREATED,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

async fn record_form(
    State(calls): State<Calls>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        parts.push(RecordedPart {
            name: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            data: field.bytes().await.unwrap(),
        });
    }
    calls.lock().unwrap().push(Recorded {
        path: "/ingest".into(),
        headers,
        body: Bytes::new(),
        parts,
    });
    Json(json!({ "received": true }))
}

async fn fail(State(calls): State<Calls>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    calls.lock().unwrap().push(Recorded {
        path: "/fail".into(),
        headers,
        body,
        parts: Vec::new(),
    });
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::CONTENT_TYPE, "text/plain")],
        "workflow paused",
    )
}

async fn download(State(calls): State<Calls>, headers: HeaderMap, body: Bytes) -> Response {
    calls.lock().unwrap().push(Recorded {
        path: "/download".into(),
        headers,
        body,
        parts: Vec::new(),
    });
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_DISPOSITION, "attachment; filename=\"transcript.txt\"")
        .body(Body::from(vec![0u8, 159, 146, 150, 255]))
        .unwrap()
}

/// Stand-in workflow backend that records every call it receives.
pub async fn spawn_upstream() -> (String, Calls) {
    let calls: Calls = Arc::default();
    let router = Router::new()
        .route("/start", post(echo_json))
        .route("/ingest", post(record_form))
        .route("/fail", post(fail))
        .route("/download", post(download))
        .with_state(calls.clone());
    (spawn(router).await, calls)
}

#[derive(Debug, Default)]
pub struct ProviderCalls {
    pub refreshes: Vec<String>,
    pub logouts: Vec<String>,
}

pub type Provider = Arc<Mutex<ProviderCalls>>;

async fn refresh(State(calls): State<Provider>, Json(body): Json<serde_json::Value>) -> Response {
    let refresh_token = body["refresh_token"].as_str().unwrap_or_default().to_string();
    calls.lock().unwrap().refreshes.push(refresh_token.clone());
    if refresh_token != "good-refresh" {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" }))).into_response();
    }
    Json(json!({
        "access_token": token("user-1", 3600),
        "refresh_token": "rotated-refresh",
        "token_type": "bearer",
        "expires_in": 3600,
    }))
    .into_response()
}

async fn logout(State(calls): State<Provider>, headers: HeaderMap) -> StatusCode {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    calls.lock().unwrap().logouts.push(auth);
    StatusCode::NO_CONTENT
}

/// Stand-in auth provider implementing the refresh grant and logout.
pub async fn spawn_provider() -> (String, Provider) {
    let calls: Provider = Arc::default();
    let router = Router::new()
        .route("/auth/v1/token", post(refresh))
        .route("/auth/v1/logout", post(logout))
        .with_state(calls.clone());
    (spawn(router).await, calls)
}
