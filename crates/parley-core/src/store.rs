use tracing::debug;
use uuid::Uuid;

use parley_db::Database;
use parley_types::models::{Message, UserId};
use parley_types::pagination::{Page, PageRequest};
use parley_types::{ChatError, ChatResult};

use crate::registry::ThreadRegistry;
use crate::{access, message_from_row};

pub const MAX_MESSAGE_CHARS: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageFilter {
    All,
    UnreadOnly,
}

/// Message creation, lookup and read state.
pub struct MessageStore<'a> {
    db: &'a Database,
}

impl<'a> MessageStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Posts `text` into a thread the sender takes part in.
    pub fn create(&self, sender: UserId, thread_id: Uuid, text: &str) -> ChatResult<Message> {
        let text = validate_text(text)?;

        let thread = match ThreadRegistry::new(self.db).fetch(thread_id) {
            Ok(thread) => thread,
            Err(ChatError::NotFound(_)) => {
                return Err(ChatError::invalid(
                    "thread",
                    format!("Invalid pk \"{}\" - object does not exist.", thread_id),
                ));
            }
            Err(e) => return Err(e),
        };
        access::ensure_participant(&thread, sender)?;

        let row = self.db.insert_message(&thread.id.to_string(), sender, text)?;
        debug!("Message {} posted to thread {} by user {}", row.id, thread.id, sender);

        message_from_row(row)
    }

    /// Messages from every thread `user_id` takes part in, ordered by id.
    pub fn list_for(
        &self,
        user_id: UserId,
        filter: MessageFilter,
        page: PageRequest,
    ) -> ChatResult<Page<Message>> {
        let unread_only = filter == MessageFilter::UnreadOnly;

        let count = self.db.count_messages_for_user(user_id, unread_only)?;
        let results = self
            .db
            .list_messages_for_user(user_id, unread_only, page.limit(), page.offset())?
            .into_iter()
            .map(message_from_row)
            .collect::<ChatResult<Vec<_>>>()?;

        Ok(Page::new(page, count, results))
    }

    pub fn get(&self, message_id: i64, caller: UserId) -> ChatResult<Message> {
        let row = self
            .db
            .get_message(message_id)?
            .ok_or_else(|| message_not_found(message_id))?;
        let message = message_from_row(row)?;

        let thread = ThreadRegistry::new(self.db).fetch(message.thread)?;
        access::ensure_participant(&thread, caller)?;

        Ok(message)
    }

    /// Idempotent: an already-read message is returned unchanged.
    pub fn mark_as_read(&self, message_id: i64, caller: UserId) -> ChatResult<Message> {
        let mut message = self.get(message_id, caller)?;
        if message.is_read {
            return Ok(message);
        }

        if !self.db.mark_message_read(message_id)? {
            return Err(message_not_found(message_id));
        }
        message.is_read = true;
        debug!("Message {} marked as read by user {}", message_id, caller);

        Ok(message)
    }

    /// Hard delete. Same gating as `get`.
    pub fn delete(&self, message_id: i64, caller: UserId) -> ChatResult<()> {
        let message = self.get(message_id, caller)?;

        if !self.db.delete_message(message.id)? {
            return Err(message_not_found(message_id));
        }
        debug!("Message {} deleted by user {}", message_id, caller);

        Ok(())
    }
}

/// Trims the text and checks it is non-empty and within the length cap.
fn validate_text(text: &str) -> ChatResult<&str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ChatError::invalid("text", "This field may not be blank."));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ChatError::invalid(
            "text",
            format!("Ensure this field has no more than {} characters.", MAX_MESSAGE_CHARS),
        ));
    }
    Ok(text)
}

fn message_not_found(message_id: i64) -> ChatError {
    ChatError::not_found(format!("Message {} not found.", message_id))
}
