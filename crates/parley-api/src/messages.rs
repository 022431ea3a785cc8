use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::{JsonRejection, QueryRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use parley_core::{MessageFilter, MessageStore};
use parley_types::ChatError;
use parley_types::api::{Claims, CreateMessageRequest};
use parley_types::pagination::PageRequest;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

fn parse_message_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ChatError::not_found(format!("Message {} not found.", raw)).into())
}

async fn list_filtered(
    state: AppState,
    claims: Claims,
    query: Result<Query<PageRequest>, QueryRejection>,
    filter: MessageFilter,
) -> Result<impl IntoResponse, ApiError> {
    let Query(page) = query?;
    let caller = claims.sub;

    let page = run_blocking(&state, move |db| {
        MessageStore::new(db).list_for(caller, filter, page)
    })
    .await?;

    Ok(Json(page))
}

/// GET /messages — every message in the caller's threads, paginated.
pub async fn list_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    list_filtered(state, claims, query, MessageFilter::All).await
}

/// GET /messages/unread — unread messages in the caller's threads, paginated.
pub async fn list_unread_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    list_filtered(state, claims, query, MessageFilter::UnreadOnly).await
}

pub async fn create_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let thread_id = req
        .thread
        .parse::<Uuid>()
        .map_err(|_| ChatError::invalid("thread", format!("\"{}\" is not a valid UUID.", req.thread)))?;
    let sender = claims.sub;

    let message = run_blocking(&state, move |db| {
        MessageStore::new(db).create(sender, thread_id, &req.text)
    })
    .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id = parse_message_id(&message_id)?;
    let caller = claims.sub;

    let message = run_blocking(&state, move |db| MessageStore::new(db).get(message_id, caller)).await?;

    Ok(Json(message))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id = parse_message_id(&message_id)?;
    let caller = claims.sub;

    run_blocking(&state, move |db| MessageStore::new(db).delete(message_id, caller)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /messages/{message_id}/mark-as-read
pub async fn mark_as_read(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let message_id = parse_message_id(&message_id)?;
    let caller = claims.sub;

    let message = run_blocking(&state, move |db| {
        MessageStore::new(db).mark_as_read(message_id, caller)
    })
    .await?;

    Ok(Json(message))
}
