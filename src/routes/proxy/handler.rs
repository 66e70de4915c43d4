use axum::{
    body::Bytes,
    extract::{FromRequest, Multipart, Query, Request, State},
    http::{StatusCode, header},
    response::Response,
};
use reqwest::multipart::{Form, Part};

use crate::{
    AppState,
    error::AppError,
    upstream::{OutboundBody, Target, UpstreamClient, outbound_file_name},
};

use super::model::ProxyQuery;

#[axum::debug_handler]
pub async fn forward(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
    request: Request,
) -> Result<Response, AppError> {
    let target: Target = query.target.as_deref().unwrap_or_default().parse()?;
    let client = UpstreamClient::new(state.http.clone(), &state.config.upstream)?;

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    let body = if content_type.starts_with("application/json") {
        let bytes = Bytes::from_request(request, &state)
            .await
            .map_err(|e| AppError::InvalidBody(e.status(), e.body_text()))?;
        OutboundBody::Json(bytes)
    } else if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::InvalidBody(e.status(), e.body_text()))?;
        OutboundBody::Multipart(rebuild_form(multipart).await?)
    } else {
        let stream = request.into_body().into_data_stream();
        OutboundBody::Stream(reqwest::Body::wrap_stream(stream))
    };

    client.forward(target, body).await
}

/// Materializes the inbound form and re-emits it so reqwest generates a
/// fresh boundary. File parts keep their filename and content type.
async fn rebuild_form(mut multipart: Multipart) -> Result<Form, AppError> {
    let mut form = Form::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidBody(e.status(), e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidBody(e.status(), e.body_text()))?;

        form = match file_name {
            Some(file_name) => {
                let len = data.len() as u64;
                let mut part = Part::stream_with_length(data, len)
                    .file_name(outbound_file_name(Some(&file_name)).to_string());
                if let Some(content_type) = content_type {
                    part = part.mime_str(&content_type).map_err(|e| {
                        AppError::InvalidBody(StatusCode::BAD_REQUEST, e.to_string())
                    })?;
                }
                form.part(name, part)
            }
            None => form.text(name, String::from_utf8_lossy(&data).into_owned()),
        };
    }

    Ok(form)
}
