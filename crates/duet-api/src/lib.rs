pub mod auth;
pub mod middleware;
pub mod pages;
pub mod songs;

use std::sync::Arc;

use duet_db::Database;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    /// How long a login stays valid before the session row expires.
    pub session_ttl: chrono::Duration,
}
