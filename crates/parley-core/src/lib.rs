//! Thread and message rules on top of `parley-db`.
//!
//! Every operation is synchronous and runs against a borrowed [`Database`];
//! callers on an async runtime should hop onto a blocking thread first.

pub mod access;
pub mod registry;
pub mod store;

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use parley_db::models::{MessageRow, ThreadRow};
use parley_types::ChatResult;
use parley_types::models::{Message, ParticipantPair, Thread};

pub use registry::ThreadRegistry;
pub use store::{MessageFilter, MessageStore};

fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("corrupt timestamp '{}'", raw))?
        .with_timezone(&Utc))
}

fn parse_uuid(raw: &str) -> anyhow::Result<Uuid> {
    raw.parse::<Uuid>().with_context(|| format!("corrupt uuid '{}'", raw))
}

fn thread_from_row(row: ThreadRow) -> ChatResult<Thread> {
    let participants = ParticipantPair::new(row.user_low, row.user_high)
        .ok_or_else(|| anyhow!("thread {} has a single participant", row.id))?;

    Ok(Thread {
        id: parse_uuid(&row.id)?,
        participants,
        created: parse_timestamp(&row.created_at)?,
        updated: parse_timestamp(&row.updated_at)?,
    })
}

fn message_from_row(row: MessageRow) -> ChatResult<Message> {
    Ok(Message {
        id: row.id,
        sender: row.sender_id,
        thread: parse_uuid(&row.thread_id)?,
        text: row.text,
        created: parse_timestamp(&row.created_at)?,
        is_read: row.is_read,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use parley_db::Database;
    use parley_types::models::UserId;

    /// In-memory database with `n` registered users.
    pub fn setup(n: usize) -> (Database, Vec<UserId>) {
        let db = Database::open_in_memory().unwrap();
        let users = (0..n)
            .map(|i| db.create_user(&format!("tester{}", i + 1), "not-a-hash").unwrap().unwrap())
            .collect();
        (db, users)
    }
}
