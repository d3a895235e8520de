use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use tracing::{info, warn};

use duet_api::AppState;
use duet_types::time::now_stamp;

/// Background task that clears all songs at local midnight.
///
/// Best-effort fixed schedule: a fire missed while the process is down is
/// skipped, not caught up, and a failed run is logged and retried at the
/// next midnight. Notifications are never touched.
pub async fn run_nightly_cleanup(state: AppState) {
    loop {
        let wait = until_next_midnight(Local::now());
        tokio::time::sleep(wait).await;

        match clear_songs(&state) {
            Ok(cleared) => {
                info!("Songs cleared at midnight ({} removed)", cleared);
            }
            Err(e) => {
                warn!("Nightly cleanup error: {}", e);
            }
        }
    }
}

fn clear_songs(state: &AppState) -> anyhow::Result<usize> {
    let cleared = state.db.clear_songs()?;

    let pruned = state.db.prune_expired_sessions(&now_stamp())?;
    if pruned > 0 {
        info!("Pruned {} expired sessions", pruned);
    }

    Ok(cleared)
}

/// Time left until the next midnight in `now`'s time zone.
pub fn until_next_midnight<Tz: TimeZone>(now: DateTime<Tz>) -> Duration {
    let next = now
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| midnight.and_local_timezone(now.timezone()).earliest());

    match next {
        Some(midnight) => (midnight - now).to_std().unwrap_or(Duration::from_secs(1)),
        // Unreachable this side of NaiveDate::MAX; re-arm in an hour.
        None => Duration::from_secs(3600),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn one_minute_before_midnight() {
        let wait = until_next_midnight(utc("2024-05-05T23:59:00Z"));
        assert_eq!(wait, Duration::from_secs(60));
    }

    #[test]
    fn exactly_at_midnight_waits_a_full_day() {
        let wait = until_next_midnight(utc("2024-05-05T00:00:00Z"));
        assert_eq!(wait, Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn local_time_stays_within_a_day() {
        let wait = until_next_midnight(Local::now());
        assert!(wait > Duration::ZERO);
        assert!(wait <= Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn cleanup_clears_songs_and_expired_sessions() {
        use duet_api::AppStateInner;
        use duet_db::Database;
        use std::sync::Arc;

        let db = Database::open_in_memory().unwrap();
        db.create_user("user-a", "Aliqyan", "hash").unwrap();
        db.insert_song("s1", "user-a", "http://x", "2024-05-05 10:00:00")
            .unwrap();
        db.insert_notification("n1", "user-a", "kept", "2024-05-05 10:00:00")
            .unwrap();
        db.create_session("dead", "user-a", "2020-01-01 00:00:00", "2020-01-31 00:00:00")
            .unwrap();

        let state = Arc::new(AppStateInner {
            db,
            session_ttl: chrono::Duration::days(30),
        });

        assert_eq!(clear_songs(&state).unwrap(), 1);
        assert!(state.db.latest_song("user-a").unwrap().is_none());
        assert_eq!(state.db.notifications_for_user("user-a").unwrap().len(), 1);
        assert!(state.db.get_session("dead").unwrap().is_none());
    }
}
