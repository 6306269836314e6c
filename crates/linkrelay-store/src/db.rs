use rusqlite::{Connection, Result};

/// Open a connection to the database file with the pragmas every store expects.
pub fn open(path: &str) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
    Ok(conn)
}

/// Initialise all tables. Safe to call on every startup (idempotent).
pub fn init_db(conn: &Connection) -> Result<()> {
    create_links_table(conn)?;
    create_api_keys_table(conn)?;
    create_settings_table(conn)?;
    Ok(())
}

/// Global shortening log. Append-only; no user attribution.
fn create_links_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS links (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            long_url    TEXT NOT NULL,
            short_url   TEXT NOT NULL,
            created_at  TEXT NOT NULL
        );",
    )
}

fn create_api_keys_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS user_api_keys (
            user_id     INTEGER PRIMARY KEY NOT NULL,
            api_key     TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );",
    )
}

/// NULL columns mean "unset" and read back as the field default.
fn create_settings_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS user_settings (
            user_id       INTEGER PRIMARY KEY NOT NULL,
            header        TEXT,
            footer        TEXT,
            caption_mode  TEXT,
            updated_at    TEXT NOT NULL
        );",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_db_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('links', 'user_api_keys', 'user_settings')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }
}
