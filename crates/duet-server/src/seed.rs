use anyhow::Result;
use tracing::info;

use duet_api::auth::{hash_password, new_user_id};
use duet_db::Database;

/// First-run seeding: create the fixed soulmate pair with hashed passwords
/// and link them symmetrically. A non-empty user table skips seeding, so
/// existing data is never touched on restart.
pub fn seed_soulmates(db: &Database) -> Result<()> {
    if db.has_users()? {
        return Ok(());
    }

    let aliqyan = new_user_id();
    let manisha = new_user_id();

    db.create_user(&aliqyan, "Aliqyan", &hash_password("Manisha")?)?;
    db.create_user(&manisha, "Manisha", &hash_password("Aliqyan")?)?;
    db.link_soulmates(&aliqyan, &manisha)?;

    info!("Seeded soulmate pair Aliqyan/Manisha");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use duet_api::auth::authenticate;

    #[test]
    fn seeds_a_symmetric_pair_once() {
        let db = Database::open_in_memory().unwrap();

        seed_soulmates(&db).unwrap();
        let aliqyan = db.get_user_by_username("Aliqyan").unwrap().unwrap();
        let manisha = db.get_user_by_username("Manisha").unwrap().unwrap();
        assert_eq!(aliqyan.soulmate_id.as_deref(), Some(manisha.id.as_str()));
        assert_eq!(manisha.soulmate_id.as_deref(), Some(aliqyan.id.as_str()));

        // Second run is a no-op, not a duplicate insert.
        seed_soulmates(&db).unwrap();
        let again = db.get_user_by_username("Aliqyan").unwrap().unwrap();
        assert_eq!(again.id, aliqyan.id);
    }

    #[test]
    fn seeded_credentials_log_in() {
        let db = Database::open_in_memory().unwrap();
        seed_soulmates(&db).unwrap();

        let ttl = chrono::Duration::days(30);
        assert!(authenticate(&db, "Aliqyan", "Manisha", ttl).unwrap().is_some());
        assert!(authenticate(&db, "Manisha", "Aliqyan", ttl).unwrap().is_some());
        assert!(authenticate(&db, "Aliqyan", "Aliqyan", ttl).unwrap().is_none());
    }
}
