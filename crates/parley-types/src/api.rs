use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Thread, UserId};

// -- JWT Claims --

/// JWT claims issued by the token endpoints and checked by the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: UserId,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub user_id: UserId,
    pub username: String,
    pub token: String,
}

// -- Threads --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateThreadRequest {
    pub participant: i64,
}

/// Which endpoint a thread is being rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadOperation {
    List,
    Create,
    Retrieve,
}

/// Thread representation, one shape per endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ThreadView {
    List {
        id: Uuid,
        participants: Vec<UserId>,
    },
    Create {
        id: Uuid,
        participant: UserId,
    },
    Retrieve {
        id: Uuid,
        participants: Vec<UserId>,
        created: DateTime<Utc>,
        updated: DateTime<Utc>,
    },
}

impl ThreadView {
    /// `caller` decides which side of the pair is reported as `participant`
    /// in the create shape.
    pub fn render(op: ThreadOperation, thread: &Thread, caller: UserId) -> Self {
        match op {
            ThreadOperation::List => Self::List {
                id: thread.id,
                participants: thread.participants.to_vec(),
            },
            ThreadOperation::Create => Self::Create {
                id: thread.id,
                participant: thread
                    .participants
                    .other(caller)
                    .unwrap_or_else(|| thread.participants.high()),
            },
            ThreadOperation::Retrieve => Self::Retrieve {
                id: thread.id,
                participants: thread.participants.to_vec(),
                created: thread.created,
                updated: thread.updated,
            },
        }
    }
}

// -- Messages --

/// `thread` stays a string so a malformed id is reported as a field error.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateMessageRequest {
    pub thread: String,
    pub text: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}
