use axum::body::{Body, Bytes};
use axum::http::{HeaderValue, header};
use axum::response::Response;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::config::UpstreamConfig;
use crate::error::AppError;

use super::Target;

/// Filename used for file parts that arrive without a real name.
pub const DEFAULT_UPLOAD_NAME: &str = "upload.bin";

/// Filename browsers assign to anonymous blobs.
const PLACEHOLDER_NAME: &str = "blob";

pub enum OutboundBody {
    Json(Bytes),
    Multipart(reqwest::multipart::Form),
    Stream(reqwest::Body),
}

impl OutboundBody {
    fn kind(&self) -> &'static str {
        match self {
            OutboundBody::Json(_) => "json",
            OutboundBody::Multipart(_) => "multipart",
            OutboundBody::Stream(_) => "stream",
        }
    }

    /// Content type used on the relayed response when upstream sends none.
    fn default_response_type(&self) -> &'static str {
        match self {
            OutboundBody::Json(_) => "application/json",
            _ => "application/octet-stream",
        }
    }
}

pub fn basic_auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user, pass)))
}

pub fn outbound_file_name(inbound: Option<&str>) -> &str {
    match inbound {
        Some(name) if !name.is_empty() && name != PLACEHOLDER_NAME => name,
        _ => DEFAULT_UPLOAD_NAME,
    }
}

/// Per-request handle on the workflow backend. The shared credential lives
/// only here and never reaches the browser.
pub struct UpstreamClient<'a> {
    http: reqwest::Client,
    base_url: &'a str,
    config: &'a UpstreamConfig,
}

impl<'a> UpstreamClient<'a> {
    pub fn new(http: reqwest::Client, config: &'a UpstreamConfig) -> Result<Self, AppError> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or(AppError::MissingUpstreamConfig)?;
        Ok(Self {
            http,
            base_url,
            config,
        })
    }

    pub fn url_for(&self, target: Target) -> String {
        format!("{}{}", self.base_url, target.path(self.config))
    }

    pub async fn forward(&self, target: Target, body: OutboundBody) -> Result<Response, AppError> {
        let url = self.url_for(target);
        let kind = body.kind();
        let default_type = body.default_response_type();

        let request = self.http.post(&url).header(
            header::AUTHORIZATION,
            basic_auth_header(&self.config.basic_user, &self.config.basic_pass),
        );
        // Multipart gets its content type and boundary from reqwest; streamed
        // bodies keep none.
        let request = match body {
            OutboundBody::Json(bytes) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(bytes),
            OutboundBody::Multipart(form) => request.multipart(form),
            OutboundBody::Stream(stream) => request.body(stream),
        };

        tracing::debug!("Forwarding {} body to upstream target {}", kind, target);
        let resp = request.send().await.map_err(|e| {
            tracing::error!("Upstream call for {} failed: {}", target, e);
            AppError::UpstreamUnavailable(e)
        })?;

        tracing::info!("Upstream {} responded {}", target, resp.status());
        relay(resp, default_type)
    }
}

/// Rebuilds the upstream response for the browser: status, content type,
/// content disposition, and the body bytes unchanged.
fn relay(resp: reqwest::Response, default_type: &'static str) -> Result<Response, AppError> {
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static(default_type));
    let disposition = resp.headers().get(header::CONTENT_DISPOSITION).cloned();

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(disposition) = disposition {
        builder = builder.header(header::CONTENT_DISPOSITION, disposition);
    }

    builder
        .body(Body::from_stream(resp.bytes_stream()))
        .map_err(|e| AppError::Internal(e.to_string()))
}
