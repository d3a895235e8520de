use serde::Deserialize;
use uuid::Uuid;

// -- Auth --

/// Authenticated principal resolved by the session middleware and inserted
/// into request extensions. Canonical definition lives here in duet-types so
/// the middleware and every handler agree on it.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub soulmate_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Songs --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubmitSongForm {
    pub song_url: String,
}
