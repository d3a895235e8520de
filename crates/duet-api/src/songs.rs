use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use tracing::error;
use uuid::Uuid;

use duet_db::Database;
use duet_types::api::{CurrentUser, SubmitSongForm};
use duet_types::time::now_stamp;

use crate::AppState;

pub async fn submit_song(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Form(form): Form<SubmitSongForm>,
) -> Result<impl IntoResponse, StatusCode> {
    // Run blocking DB writes off the async runtime
    let db_state = state.clone();
    tokio::task::spawn_blocking(move || record_song(&db_state.db, &user, &form.song_url))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("song submission failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Redirect::to("/dashboard"))
}

/// Store the submitted song and fan out the notification to the soulmate.
///
/// The URL is stored as submitted, empty or malformed included, and nothing
/// stops a user submitting several songs per day. Without a soulmate the
/// song is still stored and no notification is written.
pub fn record_song(db: &Database, user: &CurrentUser, url: &str) -> anyhow::Result<()> {
    let now = now_stamp();

    db.insert_song(
        &Uuid::new_v4().to_string(),
        &user.id.to_string(),
        url,
        &now,
    )?;

    if let Some(soulmate_id) = &user.soulmate_id {
        let message = format!(
            "Your soulmate {} uploaded the song of the day!",
            user.username
        );
        db.insert_notification(
            &Uuid::new_v4().to_string(),
            &soulmate_id.to_string(),
            &message,
            &now,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_db::Database;

    fn seeded_pair(db: &Database) -> (CurrentUser, CurrentUser) {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        db.create_user(&a.to_string(), "Aliqyan", "hash-a").unwrap();
        db.create_user(&b.to_string(), "Manisha", "hash-b").unwrap();
        db.link_soulmates(&a.to_string(), &b.to_string()).unwrap();

        (
            CurrentUser {
                id: a,
                username: "Aliqyan".into(),
                soulmate_id: Some(b),
            },
            CurrentUser {
                id: b,
                username: "Manisha".into(),
                soulmate_id: Some(a),
            },
        )
    }

    #[test]
    fn submission_notifies_the_soulmate() {
        let db = Database::open_in_memory().unwrap();
        let (aliqyan, manisha) = seeded_pair(&db);

        record_song(&db, &aliqyan, "http://x").unwrap();

        let song = db.latest_song(&aliqyan.id.to_string()).unwrap().unwrap();
        assert_eq!(song.url, "http://x");

        let notes = db
            .notifications_for_user(&manisha.id.to_string())
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.contains("Aliqyan uploaded the song of the day"));

        // The submitter gets no notification of their own.
        assert!(
            db.notifications_for_user(&aliqyan.id.to_string())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn submission_without_soulmate_stores_song_only() {
        let db = Database::open_in_memory().unwrap();
        let solo = Uuid::new_v4();
        db.create_user(&solo.to_string(), "Solo", "hash").unwrap();

        let user = CurrentUser {
            id: solo,
            username: "Solo".into(),
            soulmate_id: None,
        };

        record_song(&db, &user, "http://alone").unwrap();

        assert!(db.latest_song(&solo.to_string()).unwrap().is_some());
        assert!(
            db.notifications_for_user(&solo.to_string())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn multiple_submissions_per_day_are_allowed() {
        let db = Database::open_in_memory().unwrap();
        let (aliqyan, manisha) = seeded_pair(&db);

        record_song(&db, &aliqyan, "http://first").unwrap();
        record_song(&db, &aliqyan, "http://second").unwrap();

        // Dashboard surfaces the most recent one; both notifications exist.
        let latest = db.latest_song(&aliqyan.id.to_string()).unwrap().unwrap();
        assert_eq!(latest.url, "http://second");
        assert_eq!(
            db.notifications_for_user(&manisha.id.to_string())
                .unwrap()
                .len(),
            2
        );
    }
}
