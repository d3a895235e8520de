use crate::Database;
use crate::models::{NotificationRow, SessionRow, SongRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    /// Link two users as mutual soulmates in one transaction.
    ///
    /// The schema stores the link per row; writing both directions together
    /// is what keeps the pairing symmetric.
    pub fn link_soulmates(&self, a: &str, b: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute("UPDATE users SET soulmate_id = ?1 WHERE id = ?2", (b, a))?;
            tx.execute("UPDATE users SET soulmate_id = ?1 WHERE id = ?2", (a, b))?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn has_users(&self) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool =
                conn.query_row("SELECT EXISTS(SELECT 1 FROM users)", [], |row| row.get(0))?;
            Ok(exists)
        })
    }

    // -- Songs --

    pub fn insert_song(&self, id: &str, user_id: &str, url: &str, created_at: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO songs (id, url, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, url, user_id, created_at),
            )?;
            Ok(())
        })
    }

    /// A user's most recent song, if any. Timestamps have second precision,
    /// so ties fall back to insertion order.
    pub fn latest_song(&self, user_id: &str) -> Result<Option<SongRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, user_id, created_at FROM songs
                 WHERE user_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
            )?;

            let row = stmt.query_row([user_id], song_from_row).optional()?;
            Ok(row)
        })
    }

    /// A user's most recent song inside `[start, end)`.
    ///
    /// Callers pass the local-day bounds to get "today's song"; the stored
    /// format compares lexicographically in chronological order.
    pub fn song_in_range(&self, user_id: &str, start: &str, end: &str) -> Result<Option<SongRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, user_id, created_at FROM songs
                 WHERE user_id = ?1 AND created_at >= ?2 AND created_at < ?3
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
            )?;

            let row = stmt
                .query_row((user_id, start, end), song_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Delete every song for every user. Returns the number of rows removed.
    pub fn clear_songs(&self) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute("DELETE FROM songs", [])?;
            Ok(deleted)
        })
    }

    // -- Notifications --

    pub fn insert_notification(
        &self,
        id: &str,
        user_id: &str,
        message: &str,
        created_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notifications (id, message, user_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                (id, message, user_id, created_at),
            )?;
            Ok(())
        })
    }

    pub fn notifications_for_user(&self, user_id: &str) -> Result<Vec<NotificationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, message, user_id, created_at FROM notifications
                 WHERE user_id = ?1
                 ORDER BY created_at DESC",
            )?;

            let rows = stmt
                .query_map([user_id], |row| {
                    Ok(NotificationRow {
                        id: row.get(0)?,
                        message: row.get(1)?,
                        user_id: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Sessions --

    pub fn create_session(
        &self,
        token: &str,
        user_id: &str,
        created_at: &str,
        expires_at: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
                (token, user_id, created_at, expires_at),
            )?;
            Ok(())
        })
    }

    pub fn get_session(&self, token: &str) -> Result<Option<SessionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?1",
            )?;

            let row = stmt
                .query_row([token], |row| {
                    Ok(SessionRow {
                        token: row.get(0)?,
                        user_id: row.get(1)?,
                        created_at: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                })
                .optional()?;

            Ok(row)
        })
    }

    /// Resolve a session token to its user, ignoring expired sessions.
    pub fn session_user(&self, token: &str, now: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.password, u.soulmate_id, u.created_at
                 FROM sessions s
                 JOIN users u ON s.user_id = u.id
                 WHERE s.token = ?1 AND s.expires_at > ?2",
            )?;

            let row = stmt.query_row((token, now), user_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn delete_session(&self, token: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
            Ok(())
        })
    }

    /// Remove sessions past their expiry. Returns the number pruned.
    pub fn prune_expired_sessions(&self, now: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let pruned = conn.execute("DELETE FROM sessions WHERE expires_at <= ?1", [now])?;
            Ok(pruned)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is a fixed identifier from this module, never user input.
    let sql = format!(
        "SELECT id, username, password, soulmate_id, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt.query_row([value], user_from_row).optional()?;
    Ok(row)
}

fn user_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        soulmate_id: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn song_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SongRow> {
    Ok(SongRow {
        id: row.get(0)?,
        url: row.get(1)?,
        user_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}
