use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use parley_types::ChatError;
use parley_types::api::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail, field) = match self {
            ApiError::Chat(ChatError::InvalidArgument { field, reason }) => {
                (StatusCode::BAD_REQUEST, reason, Some(field.to_string()))
            }
            ApiError::Chat(ChatError::NotFound(msg)) => (StatusCode::NOT_FOUND, msg, None),
            ApiError::Chat(ChatError::PermissionDenied(msg)) => (StatusCode::FORBIDDEN, msg, None),
            ApiError::Chat(ChatError::Unauthenticated(msg)) => (StatusCode::UNAUTHORIZED, msg, None),
            ApiError::Chat(ChatError::Conflict(msg)) => (StatusCode::CONFLICT, msg, None),
            ApiError::Chat(ChatError::Storage(e)) => {
                error!("Storage error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
                None,
            ),
        };

        (status, Json(ErrorBody { detail, field })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        let cases = [
            (ChatError::invalid("text", "too long"), StatusCode::BAD_REQUEST),
            (ChatError::not_found("gone"), StatusCode::NOT_FOUND),
            (ChatError::denied("nope"), StatusCode::FORBIDDEN),
            (ChatError::Unauthenticated("who".into()), StatusCode::UNAUTHORIZED),
            (ChatError::Conflict("taken".into()), StatusCode::CONFLICT),
            (
                ChatError::Storage(anyhow::anyhow!("disk on fire")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
