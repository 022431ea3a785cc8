use crate::models::{MessageRow, ThreadRow, UserRow};
use crate::{Database, timestamp_now};
use anyhow::{Result, anyhow};
use rusqlite::{Connection, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

impl Database {
    // -- Users --

    /// Returns the new user's id, or `None` if the username is already taken.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO users (username, password, created_at) VALUES (?1, ?2, ?3)",
                (username, password_hash, timestamp_now()),
            ) {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn user_exists(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM users WHERE id = ?1", [id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    // -- Threads --

    /// Fetch the thread for `(user_low, user_high)`, creating it if there is none.
    /// Returns (row, created).
    ///
    /// Runs as one IMMEDIATE transaction, so writers on other connections are
    /// serialized before the lookup. The UNIQUE violation arm only fires if that
    /// ordering is bypassed, and turns it into a lookup of the existing row.
    pub fn get_or_create_thread(&self, user_low: i64, user_high: i64) -> Result<(ThreadRow, bool)> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            if let Some(existing) = query_thread_by_pair(&tx, user_low, user_high)? {
                return Ok((existing, false));
            }

            let id = Uuid::new_v4().to_string();
            match insert_thread(&tx, &id, user_low, user_high) {
                Ok(()) => {}
                Err(e) if is_unique_violation(&e) => {
                    debug!("Thread for ({}, {}) created concurrently", user_low, user_high);
                    let existing = query_thread_by_pair(&tx, user_low, user_high)?
                        .ok_or_else(|| anyhow!("Thread for ({}, {}) vanished", user_low, user_high))?;
                    return Ok((existing, false));
                }
                Err(e) => return Err(e.into()),
            }

            let row = query_thread_by_id(&tx, &id)?
                .ok_or_else(|| anyhow!("Thread {} missing after insert", id))?;
            tx.commit()?;
            Ok((row, true))
        })
    }

    pub fn get_thread(&self, id: &str) -> Result<Option<ThreadRow>> {
        self.with_conn(|conn| query_thread_by_id(conn, id))
    }

    /// Threads the user takes part in, newest first.
    pub fn list_threads_for_user(&self, user_id: i64) -> Result<Vec<ThreadRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_low, user_high, created_at, updated_at
                 FROM threads
                 WHERE user_low = ?1 OR user_high = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;

            let rows = stmt
                .query_map([user_id], map_thread)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Messages go with the thread via ON DELETE CASCADE.
    pub fn delete_thread(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM threads WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, thread_id: &str, sender_id: i64, text: &str) -> Result<MessageRow> {
        self.with_conn(|conn| {
            let created_at = timestamp_now();
            conn.execute(
                "INSERT INTO messages (thread_id, sender_id, text, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![thread_id, sender_id, text, created_at],
            )?;

            Ok(MessageRow {
                id: conn.last_insert_rowid(),
                thread_id: thread_id.to_string(),
                sender_id,
                text: text.to_string(),
                created_at,
                is_read: false,
            })
        })
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, thread_id, sender_id, text, created_at, is_read FROM messages WHERE id = ?1",
                [id],
                map_message,
            )
            .optional()
        })
    }

    /// All messages of one thread, oldest first.
    pub fn list_thread_messages(&self, thread_id: &str) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, thread_id, sender_id, text, created_at, is_read
                 FROM messages
                 WHERE thread_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;

            let rows = stmt
                .query_map([thread_id], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// One window of the messages in every thread `user_id` takes part in,
    /// ordered by id.
    pub fn list_messages_for_user(
        &self,
        user_id: i64,
        unread_only: bool,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT m.id, m.thread_id, m.sender_id, m.text, m.created_at, m.is_read
                 FROM messages m
                 JOIN threads t ON t.id = m.thread_id
                 WHERE (t.user_low = ?1 OR t.user_high = ?1)
                   AND (?2 = 0 OR m.is_read = 0)
                 ORDER BY m.id ASC
                 LIMIT ?3 OFFSET ?4",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, unread_only, limit, offset], map_message)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn count_messages_for_user(&self, user_id: i64, unread_only: bool) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*)
                 FROM messages m
                 JOIN threads t ON t.id = m.thread_id
                 WHERE (t.user_low = ?1 OR t.user_high = ?1)
                   AND (?2 = 0 OR m.is_read = 0)",
                rusqlite::params![user_id, unread_only],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    pub fn delete_message(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM messages WHERE id = ?1", [id])?;
            Ok(deleted > 0)
        })
    }

    /// Sets `is_read`. Returns false if no such message exists.
    pub fn mark_message_read(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let updated = conn.execute("UPDATE messages SET is_read = 1 WHERE id = ?1", [id])?;
            Ok(updated > 0)
        })
    }
}

fn insert_thread(conn: &Connection, id: &str, user_low: i64, user_high: i64) -> rusqlite::Result<()> {
    let now = timestamp_now();
    conn.execute(
        "INSERT INTO threads (id, user_low, user_high, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
        rusqlite::params![id, user_low, user_high, now],
    )?;
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_thread_by_id(conn: &Connection, id: &str) -> Result<Option<ThreadRow>> {
    conn.query_row(
        "SELECT id, user_low, user_high, created_at, updated_at FROM threads WHERE id = ?1",
        [id],
        map_thread,
    )
    .optional()
}

fn query_thread_by_pair(conn: &Connection, user_low: i64, user_high: i64) -> Result<Option<ThreadRow>> {
    conn.query_row(
        "SELECT id, user_low, user_high, created_at, updated_at
         FROM threads WHERE user_low = ?1 AND user_high = ?2",
        [user_low, user_high],
        map_thread,
    )
    .optional()
}

fn map_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<ThreadRow> {
    Ok(ThreadRow {
        id: row.get(0)?,
        user_low: row.get(1)?,
        user_high: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        thread_id: row.get(1)?,
        sender_id: row.get(2)?,
        text: row.get(3)?,
        created_at: row.get(4)?,
        is_read: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
