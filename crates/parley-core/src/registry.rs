use tracing::{debug, info};
use uuid::Uuid;

use parley_db::Database;
use parley_types::models::{Message, ParticipantPair, Thread, UserId};
use parley_types::{ChatError, ChatResult};

use crate::{access, message_from_row, thread_from_row};

/// Creates, finds and deletes threads. At most one thread exists per
/// unordered pair of users.
pub struct ThreadRegistry<'a> {
    db: &'a Database,
}

impl<'a> ThreadRegistry<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Returns the thread shared by `initiator` and `participant`, creating it
    /// on first contact. The flag is true when a new thread was made.
    pub fn create_or_get(&self, initiator: UserId, participant: i64) -> ChatResult<(Thread, bool)> {
        if participant <= 0 {
            return Err(ChatError::invalid(
                "participant",
                "A participant ID must be a positive int",
            ));
        }

        let pair = ParticipantPair::new(initiator, participant).ok_or_else(|| {
            ChatError::invalid("participant", "A thread needs a participant other than yourself")
        })?;

        if !self.db.user_exists(participant)? {
            return Err(ChatError::not_found(format!("User {} not found.", participant)));
        }

        let (row, created) = self.db.get_or_create_thread(pair.low(), pair.high())?;
        let thread = thread_from_row(row)?;

        if created {
            info!("Thread {} created for users {} and {}", thread.id, pair.low(), pair.high());
        } else {
            debug!("Reusing thread {} for users {} and {}", thread.id, pair.low(), pair.high());
        }

        Ok((thread, created))
    }

    /// The user's threads, newest first.
    pub fn list_for(&self, user_id: UserId) -> ChatResult<Vec<Thread>> {
        self.db
            .list_threads_for_user(user_id)?
            .into_iter()
            .map(thread_from_row)
            .collect()
    }

    pub fn get(&self, thread_id: Uuid, caller: UserId) -> ChatResult<Thread> {
        let thread = self.fetch(thread_id)?;
        access::ensure_participant(&thread, caller)?;
        Ok(thread)
    }

    /// Hard delete. The thread's messages go with it.
    pub fn delete(&self, thread_id: Uuid, caller: UserId) -> ChatResult<()> {
        let thread = self.get(thread_id, caller)?;

        if !self.db.delete_thread(&thread.id.to_string())? {
            return Err(thread_not_found(thread_id));
        }

        info!("Thread {} deleted by user {}", thread_id, caller);
        Ok(())
    }

    /// Messages of the thread, oldest first.
    pub fn list_messages(&self, thread_id: Uuid, caller: UserId) -> ChatResult<Vec<Message>> {
        let thread = self.get(thread_id, caller)?;

        self.db
            .list_thread_messages(&thread.id.to_string())?
            .into_iter()
            .map(message_from_row)
            .collect()
    }

    /// Loads a thread without any membership check.
    pub(crate) fn fetch(&self, thread_id: Uuid) -> ChatResult<Thread> {
        let row = self
            .db
            .get_thread(&thread_id.to_string())?
            .ok_or_else(|| thread_not_found(thread_id))?;
        thread_from_row(row)
    }
}

fn thread_not_found(thread_id: Uuid) -> ChatError {
    ChatError::not_found(format!("Thread {} not found.", thread_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MessageStore;
    use crate::testing::setup;

    #[test]
    fn create_or_get_is_idempotent() {
        let (db, users) = setup(2);
        let registry = ThreadRegistry::new(&db);

        let (first, created) = registry.create_or_get(users[0], users[1]).unwrap();
        assert!(created);
        let (second, created) = registry.create_or_get(users[0], users[1]).unwrap();
        assert!(!created);

        assert_eq!(first.id, second.id);
        assert_eq!(registry.list_for(users[0]).unwrap().len(), 1);
    }

    #[test]
    fn create_or_get_ignores_argument_order() {
        let (db, users) = setup(2);
        let registry = ThreadRegistry::new(&db);

        let (ab, _) = registry.create_or_get(users[0], users[1]).unwrap();
        let (ba, created) = registry.create_or_get(users[1], users[0]).unwrap();

        assert!(!created);
        assert_eq!(ab.id, ba.id);
    }

    #[test]
    fn concurrent_first_contact_yields_one_thread() {
        let (db, users) = setup(2);
        let (a, b) = (users[0], users[1]);

        let ids: Vec<Uuid> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let db = &db;
                    s.spawn(move || {
                        let (initiator, participant) = if i % 2 == 0 { (a, b) } else { (b, a) };
                        ThreadRegistry::new(db)
                            .create_or_get(initiator, participant)
                            .unwrap()
                            .0
                            .id
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(ThreadRegistry::new(&db).list_for(a).unwrap().len(), 1);
    }

    #[test]
    fn rejects_non_positive_participant() {
        let (db, users) = setup(1);
        let registry = ThreadRegistry::new(&db);

        for bad in [0, -5] {
            let err = registry.create_or_get(users[0], bad).unwrap_err();
            assert!(matches!(err, ChatError::InvalidArgument { field: "participant", .. }));
        }
    }

    #[test]
    fn rejects_thread_with_self() {
        let (db, users) = setup(1);
        let err = ThreadRegistry::new(&db).create_or_get(users[0], users[0]).unwrap_err();
        assert!(matches!(err, ChatError::InvalidArgument { .. }));
    }

    #[test]
    fn unknown_participant_is_not_found() {
        let (db, users) = setup(1);
        let err = ThreadRegistry::new(&db).create_or_get(users[0], 4242).unwrap_err();
        assert!(matches!(err, ChatError::NotFound(_)));
    }

    #[test]
    fn three_partners_give_three_threads_newest_first() {
        let (db, users) = setup(4);
        let registry = ThreadRegistry::new(&db);

        let created: Vec<Uuid> = users[1..]
            .iter()
            .map(|&p| registry.create_or_get(users[0], p).unwrap().0.id)
            .collect();

        let listed = registry.list_for(users[0]).unwrap();
        assert_eq!(listed.len(), 3);
        for thread in &listed {
            assert_eq!(thread.participants.to_vec().len(), 2);
            assert!(thread.participants.contains(users[0]));
        }

        let listed_ids: Vec<Uuid> = listed.iter().map(|t| t.id).collect();
        let mut newest_first = created.clone();
        newest_first.reverse();
        assert_eq!(listed_ids, newest_first);

        // B only sees the thread with A
        assert_eq!(registry.list_for(users[1]).unwrap().len(), 1);
    }

    #[test]
    fn outsiders_are_denied() {
        let (db, users) = setup(3);
        let registry = ThreadRegistry::new(&db);
        let (thread, _) = registry.create_or_get(users[0], users[1]).unwrap();
        let outsider = users[2];

        assert!(matches!(
            registry.get(thread.id, outsider),
            Err(ChatError::PermissionDenied(_))
        ));
        assert!(matches!(
            registry.list_messages(thread.id, outsider),
            Err(ChatError::PermissionDenied(_))
        ));
        assert!(matches!(
            registry.delete(thread.id, outsider),
            Err(ChatError::PermissionDenied(_))
        ));

        // Still there for its participants
        assert_eq!(registry.get(thread.id, users[1]).unwrap().id, thread.id);
    }

    #[test]
    fn unknown_thread_is_not_found() {
        let (db, users) = setup(1);
        let registry = ThreadRegistry::new(&db);
        assert!(matches!(
            registry.get(Uuid::new_v4(), users[0]),
            Err(ChatError::NotFound(_))
        ));
    }

    #[test]
    fn delete_cascades_to_messages() {
        let (db, users) = setup(2);
        let registry = ThreadRegistry::new(&db);
        let store = MessageStore::new(&db);
        let (thread, _) = registry.create_or_get(users[0], users[1]).unwrap();

        let sent: Vec<i64> = (0..4)
            .map(|i| store.create(users[0], thread.id, &format!("hello {}", i)).unwrap().id)
            .collect();

        registry.delete(thread.id, users[1]).unwrap();

        assert!(matches!(
            registry.list_messages(thread.id, users[0]),
            Err(ChatError::NotFound(_))
        ));
        for id in sent {
            assert!(matches!(store.get(id, users[0]), Err(ChatError::NotFound(_))));
        }
        assert!(registry.list_for(users[0]).unwrap().is_empty());
    }

    #[test]
    fn list_messages_is_ascending() {
        let (db, users) = setup(2);
        let registry = ThreadRegistry::new(&db);
        let store = MessageStore::new(&db);
        let (thread, _) = registry.create_or_get(users[0], users[1]).unwrap();

        for i in 0..10 {
            store
                .create(users[0], thread.id, &format!("This is the text for message {}", i))
                .unwrap();
        }

        let messages = registry.list_messages(thread.id, users[0]).unwrap();
        assert_eq!(messages.len(), 10);
        assert!(messages.windows(2).all(|w| w[0].created <= w[1].created && w[0].id < w[1].id));
        assert_eq!(messages[0].text, "This is the text for message 0");
    }
}
