mod cleanup;
mod seed;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing::info;

use duet_api::middleware::require_session;
use duet_api::{AppState, AppStateInner, auth, pages, songs};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duet=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let db_path = std::env::var("DUET_DB_PATH").unwrap_or_else(|_| "duet.db".into());
    let host = std::env::var("DUET_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("DUET_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let session_ttl_days: i64 = std::env::var("DUET_SESSION_TTL_DAYS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    // Init database and seed the fixed pair on first run
    let db = duet_db::Database::open(&PathBuf::from(&db_path))?;
    seed::seed_soulmates(&db)?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        session_ttl: chrono::Duration::days(session_ttl_days),
    });

    // Background cleanup task (clears songs at local midnight)
    tokio::spawn(cleanup::run_nightly_cleanup(state.clone()));

    // Routes
    let public_routes = Router::new()
        .route("/", get(pages::login_page))
        .route("/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/logout", get(auth::logout))
        .route("/dashboard", get(pages::dashboard))
        .route("/submit_song", post(songs::submit_song))
        .route("/all_songs", get(pages::all_songs))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Duet server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
