use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);"
    )?;

    let version: i64 = conn
        .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, threads, messages)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            -- A thread is keyed by its participant pair, smaller id first.
            CREATE TABLE threads (
                id          TEXT PRIMARY KEY,
                user_low    INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                user_high   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL,
                CHECK (user_low < user_high),
                UNIQUE (user_low, user_high)
            );

            CREATE INDEX idx_threads_user_high ON threads(user_high);

            CREATE TABLE messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                thread_id   TEXT NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
                sender_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text        TEXT NOT NULL CHECK (length(text) <= 250),
                created_at  TEXT NOT NULL,
                is_read     INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_messages_thread ON messages(thread_id, created_at);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        run(&conn).unwrap();

        let versions: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[test]
    fn thread_pair_must_be_ordered() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO users (username, password, created_at) VALUES ('a', 'x', 'now');
             INSERT INTO users (username, password, created_at) VALUES ('b', 'x', 'now');",
        )
        .unwrap();

        let reversed = conn.execute(
            "INSERT INTO threads (id, user_low, user_high, created_at, updated_at)
             VALUES ('t1', 2, 1, 'now', 'now')",
            [],
        );
        assert!(reversed.is_err());
    }
}
