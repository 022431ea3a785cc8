use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = i64;

/// The two members of a thread, stored low id first so that {A, B} and {B, A}
/// resolve to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantPair {
    low: UserId,
    high: UserId,
}

impl ParticipantPair {
    /// Returns `None` when both ids are the same user.
    pub fn new(a: UserId, b: UserId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn low(&self) -> UserId {
        self.low
    }

    pub fn high(&self) -> UserId {
        self.high
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.low == user_id || self.high == user_id
    }

    /// The participant that is not `user_id`, if `user_id` is in the pair.
    pub fn other(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.low {
            Some(self.high)
        } else if user_id == self.high {
            Some(self.low)
        } else {
            None
        }
    }

    pub fn to_vec(&self) -> Vec<UserId> {
        vec![self.low, self.high]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub participants: ParticipantPair,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender: UserId,
    pub thread: Uuid,
    pub text: String,
    pub created: DateTime<Utc>,
    pub is_read: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_order_independent() {
        assert_eq!(ParticipantPair::new(7, 3), ParticipantPair::new(3, 7));

        let pair = ParticipantPair::new(7, 3).unwrap();
        assert_eq!(pair.low(), 3);
        assert_eq!(pair.high(), 7);
    }

    #[test]
    fn pair_rejects_same_user() {
        assert!(ParticipantPair::new(4, 4).is_none());
    }

    #[test]
    fn pair_other_participant() {
        let pair = ParticipantPair::new(1, 2).unwrap();
        assert_eq!(pair.other(1), Some(2));
        assert_eq!(pair.other(2), Some(1));
        assert_eq!(pair.other(3), None);
        assert!(!pair.contains(3));
    }
}
