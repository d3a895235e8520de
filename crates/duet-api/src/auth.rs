use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use rand::RngCore;
use tracing::{error, info};
use uuid::Uuid;

use duet_db::Database;
use duet_types::api::LoginForm;
use duet_types::time::{now_stamp, stamp_in};

use crate::AppState;

pub const SESSION_COOKIE: &str = "duet_session";

/// Hash a password with Argon2id. Used at seed time; login verifies against
/// the stored hash.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))
}

/// Check credentials and, on success, persist a new session row.
///
/// Returns the opaque session token, or `None` for an unknown user or a
/// wrong password. No session state is written on failure.
pub fn authenticate(
    db: &Database,
    username: &str,
    password: &str,
    ttl: chrono::Duration,
) -> anyhow::Result<Option<String>> {
    let Some(user) = db.get_user_by_username(username)? else {
        return Ok(None);
    };

    let parsed_hash = PasswordHash::new(&user.password)
        .map_err(|e| anyhow::anyhow!("stored hash for {} is invalid: {}", username, e))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Ok(None);
    }

    let token = new_session_token();
    db.create_session(&token, &user.id, &now_stamp(), &stamp_in(ttl))?;

    Ok(Some(token))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, StatusCode> {
    // Run blocking DB access off the async runtime
    let db_state = state.clone();
    let username = form.username.clone();
    let token = tokio::task::spawn_blocking(move || {
        authenticate(&db_state.db, &username, &form.password, db_state.session_ttl)
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("login failed for {}: {}", form.username, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let Some(token) = token else {
        return Ok((StatusCode::UNAUTHORIZED, "Invalid credentials").into_response());
    };

    info!("{} logged in", form.username);

    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    Ok((jar.add(cookie), Redirect::to("/dashboard")).into_response())
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, StatusCode> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let token = cookie.value().to_string();
        let db_state = state.clone();
        tokio::task::spawn_blocking(move || db_state.db.delete_session(&token))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .map_err(|e| {
                error!("session delete failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
    }

    let removal = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    Ok((jar.remove(removal), Redirect::to("/")))
}

fn new_session_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    B64.encode(bytes)
}

/// Generate an id for a seeded or future user row.
pub fn new_user_id() -> String {
    Uuid::new_v4().to_string()
}
