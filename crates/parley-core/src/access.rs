//! Membership checks.
//!
//! Collections (a user's threads, a user's messages) are scoped in the query
//! and never need these. Anything addressed by id is loaded first and then
//! checked here, so an unknown id is `NotFound` and a foreign one is
//! `PermissionDenied`.
//!
//! The 403 tells a non-participant that the id exists (message ids are
//! sequential). Scoping the lookup to the caller's threads would answer 404
//! instead.

use parley_types::models::{Thread, UserId};
use parley_types::{ChatError, ChatResult};

pub fn is_participant(thread: &Thread, user_id: UserId) -> bool {
    thread.participants.contains(user_id)
}

pub fn ensure_participant(thread: &Thread, user_id: UserId) -> ChatResult<()> {
    if is_participant(thread, user_id) {
        Ok(())
    } else {
        Err(ChatError::denied("You are not a participant of this thread."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_types::models::ParticipantPair;
    use uuid::Uuid;

    #[test]
    fn only_the_pair_is_admitted() {
        let now = Utc::now();
        let thread = Thread {
            id: Uuid::new_v4(),
            participants: ParticipantPair::new(1, 2).unwrap(),
            created: now,
            updated: now,
        };

        assert!(is_participant(&thread, 1));
        assert!(is_participant(&thread, 2));
        assert!(ensure_participant(&thread, 2).is_ok());
        assert!(matches!(
            ensure_participant(&thread, 3),
            Err(ChatError::PermissionDenied(_))
        ));
    }
}
