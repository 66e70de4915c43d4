use axum::{
    body::Bytes,
    extract::{Json, State},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{AppState, common::OkResponse, error::AppError};

use super::model::{CallbackRequest, SessionInfoResponse};

/// Copies a client-obtained session into cookies. Always answers
/// `{ ok: true }`; callers treat the cookies as the source of truth.
#[axum::debug_handler]
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> (CookieJar, Json<OkResponse>) {
    let request = CallbackRequest::parse(&body);
    let event = request.event.clone().unwrap_or_default();

    let Some(session) = request.into_session() else {
        tracing::debug!("Session callback without a usable session (event {:?})", event);
        return (jar, Json(OkResponse::ok()));
    };

    match state.auth.resolve(session).await {
        Ok(resolved) => {
            tracing::info!(
                "Storing session for user {} (event {:?}, refreshed: {})",
                resolved.claims.sub,
                event,
                resolved.refreshed
            );
            let jar = state.cookies.write(jar, &resolved.session);
            (jar, Json(OkResponse::ok()))
        }
        Err(e) => {
            tracing::warn!("Ignoring session callback: {}", e);
            (jar, Json(OkResponse::ok()))
        }
    }
}

/// Revokes the session upstream and expires every cookie variant. Never
/// redirects: the browser calls this with `fetch` and navigates itself.
#[axum::debug_handler]
pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<OkResponse>) {
    if let Some(session) = state.cookies.read(&jar) {
        if let Err(e) = state.auth.sign_out(&session.access_token).await {
            tracing::warn!("Provider sign-out failed, clearing cookies anyway: {}", e);
        }
    }

    let jar = state.cookies.clear(jar);
    tracing::info!("Session cookies cleared");
    (jar, Json(OkResponse::ok()))
}

#[axum::debug_handler]
pub async fn session_info(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<SessionInfoResponse>), AppError> {
    let session = state.cookies.read(&jar).ok_or(AppError::Unauthorized)?;
    let resolved = state
        .auth
        .resolve(session)
        .await
        .map_err(|_| AppError::Unauthorized)?;

    let jar = if resolved.refreshed {
        state.cookies.write(jar, &resolved.session)
    } else {
        jar
    };

    Ok((
        jar,
        Json(SessionInfoResponse {
            user_id: resolved.claims.sub,
            email: resolved.claims.email,
            expires_at: resolved.claims.exp,
        }),
    ))
}
