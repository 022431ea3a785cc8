pub mod auth;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod threads;

use axum::{
    Router,
    routing::{get, patch, post},
};
use tracing::error;

use parley_db::Database;
use parley_types::ChatResult;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_auth;

/// All HTTP routes. Everything except registration and token issuance needs a
/// bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/token", post(auth::obtain_token));

    let protected_routes = Router::new()
        .route("/threads", get(threads::list_threads).post(threads::create_thread))
        .route("/threads/{thread_id}", get(threads::get_thread).delete(threads::delete_thread))
        .route("/threads/{thread_id}/messages", get(threads::get_thread_messages))
        .route("/messages", get(messages::list_messages).post(messages::create_message))
        .route("/messages/unread", get(messages::list_unread_messages))
        .route("/messages/{message_id}", get(messages::get_message).delete(messages::delete_message))
        .route("/messages/{message_id}/mark-as-read", patch(messages::mark_as_read))
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// Run a database operation off the async runtime.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> ChatResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal
        })?
        .map_err(ApiError::from)
}
