//! Server-rendered pages: login, dashboard and the shared daily view.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::Html,
};
use chrono::Local;
use tracing::error;

use duet_db::models::{NotificationRow, SongRow};
use duet_types::api::CurrentUser;
use duet_types::time::day_bounds;

use crate::AppState;

const LOGIN_HTML: &str = include_str!("ui/login.html");

/// GET /
///
/// Serves the login form. No session required.
pub async fn login_page() -> Html<&'static str> {
    Html(LOGIN_HTML)
}

/// GET /dashboard
///
/// The user's most recent song plus their notifications, newest first.
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, StatusCode> {
    let db_state = state.clone();
    let user_id = user.id.to_string();

    let (latest, notifications) = tokio::task::spawn_blocking(move || {
        let latest = db_state.db.latest_song(&user_id)?;
        let notifications = db_state.db.notifications_for_user(&user_id)?;
        Ok::<_, anyhow::Error>((latest, notifications))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("dashboard query failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Html(render_dashboard(
        &user.username,
        latest.as_ref(),
        &notifications,
    )))
}

/// GET /all_songs
///
/// Today's songs for the pair. Shows a waiting message until the soulmate
/// has submitted for the current local day.
pub async fn all_songs(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, StatusCode> {
    let (start, end) = day_bounds(Local::now().date_naive());

    let db_state = state.clone();
    let user_id = user.id.to_string();
    let soulmate_id = user.soulmate_id.map(|id| id.to_string());

    let (user_song, soulmate_song) = tokio::task::spawn_blocking(move || {
        let user_song = db_state.db.song_in_range(&user_id, &start, &end)?;
        let soulmate_song = match soulmate_id {
            Some(id) => db_state.db.song_in_range(&id, &start, &end)?,
            None => None,
        };
        Ok::<_, anyhow::Error>((user_song, soulmate_song))
    })
    .await
    .map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!("all_songs query failed: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let message = if soulmate_song.is_none() {
        "Your soulmate has not uploaded the song of the day yet."
    } else {
        ""
    };

    Ok(Html(render_all_songs(
        user_song.as_ref(),
        soulmate_song.as_ref(),
        message,
    )))
}

fn render_dashboard(
    username: &str,
    latest: Option<&SongRow>,
    notifications: &[NotificationRow],
) -> String {
    let song_section = match latest {
        Some(song) => format!(
            "<p>Your latest song: <a href=\"{url}\">{url}</a> <small>({at})</small></p>",
            url = escape_html(&song.url),
            at = escape_html(&song.created_at),
        ),
        None => "<p>You have not submitted a song yet.</p>".to_string(),
    };

    let notification_items: String = notifications
        .iter()
        .map(|n| {
            format!(
                "<li>{} <small>({})</small></li>",
                escape_html(&n.message),
                escape_html(&n.created_at),
            )
        })
        .collect();

    let notification_section = if notification_items.is_empty() {
        "<p>No notifications.</p>".to_string()
    } else {
        format!("<ul>{}</ul>", notification_items)
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Duet dashboard</title></head>\n<body>\n\
         <h1>Welcome, {username}</h1>\n\
         {song_section}\n\
         <form method=\"post\" action=\"/submit_song\">\n\
           <label>Song of the day <input type=\"url\" name=\"song_url\"></label>\n\
           <button type=\"submit\">Submit</button>\n\
         </form>\n\
         <h2>Notifications</h2>\n\
         {notification_section}\n\
         <p><a href=\"/all_songs\">Today's songs</a> | <a href=\"/logout\">Log out</a></p>\n\
         </body>\n</html>\n",
        username = escape_html(username),
    )
}

fn render_all_songs(
    user_song: Option<&SongRow>,
    soulmate_song: Option<&SongRow>,
    message: &str,
) -> String {
    let message_section = if message.is_empty() {
        String::new()
    } else {
        format!("<p>{}</p>\n", escape_html(message))
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Today's songs</title></head>\n<body>\n\
         <h1>Today's songs</h1>\n\
         {message_section}\
         <h2>Yours</h2>\n{user}\n\
         <h2>Your soulmate's</h2>\n{soulmate}\n\
         <p><a href=\"/dashboard\">Back to dashboard</a></p>\n\
         </body>\n</html>\n",
        user = song_item(user_song),
        soulmate = song_item(soulmate_song),
    )
}

fn song_item(song: Option<&SongRow>) -> String {
    match song {
        Some(song) => format!(
            "<p><a href=\"{url}\">{url}</a> <small>({at})</small></p>",
            url = escape_html(&song.url),
            at = escape_html(&song.created_at),
        ),
        None => "<p>No song yet.</p>".to_string(),
    }
}

/// Minimal HTML escaping for user-controlled strings (usernames, URLs,
/// notification text).
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
