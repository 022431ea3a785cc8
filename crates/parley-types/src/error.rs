use thiserror::Error;

/// Failure taxonomy shared by the core operations and the HTTP layer.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl ChatError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn denied(what: impl Into<String>) -> Self {
        Self::PermissionDenied(what.into())
    }
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;
