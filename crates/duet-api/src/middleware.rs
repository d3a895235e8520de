use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::{error, warn};
use uuid::Uuid;

use duet_types::api::CurrentUser;
use duet_types::time::now_stamp;

use crate::AppState;
use crate::auth::SESSION_COOKIE;

/// Resolve the session cookie to a [`CurrentUser`] request extension.
///
/// A missing, unknown or expired session redirects to the login page rather
/// than returning 401: every protected route is a browser-facing page.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(Redirect::to("/").into_response());
    };

    let token = cookie.value().to_string();
    let db_state = state.clone();
    let user = tokio::task::spawn_blocking(move || db_state.db.session_user(&token, &now_stamp()))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("session lookup failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    let Some(user) = user else {
        return Ok(Redirect::to("/").into_response());
    };

    let id: Uuid = user.id.parse().map_err(|e| {
        error!("Corrupt user id '{}': {}", user.id, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let soulmate_id = user.soulmate_id.as_deref().and_then(|s| {
        s.parse::<Uuid>()
            .map_err(|e| warn!("Corrupt soulmate_id '{}' on user '{}': {}", s, user.id, e))
            .ok()
    });

    req.extensions_mut().insert(CurrentUser {
        id,
        username: user.username,
        soulmate_id,
    });

    Ok(next.run(req).await)
}
