use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use parley_core::ThreadRegistry;
use parley_types::ChatError;
use parley_types::api::{Claims, CreateThreadRequest, ThreadOperation, ThreadView};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::run_blocking;

/// Non-UUID ids cannot name a thread, so they are reported the same as unknown ones.
fn parse_thread_id(raw: &str) -> Result<Uuid, ApiError> {
    raw.parse::<Uuid>()
        .map_err(|_| ChatError::not_found(format!("Thread {} not found.", raw)).into())
}

/// GET /threads — the caller's threads, newest first.
pub async fn list_threads(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let caller = claims.sub;
    let threads = run_blocking(&state, move |db| ThreadRegistry::new(db).list_for(caller)).await?;

    let views: Vec<ThreadView> = threads
        .iter()
        .map(|thread| ThreadView::render(ThreadOperation::List, thread, caller))
        .collect();

    Ok(Json(views))
}

/// POST /threads — start a thread with `participant`, or get the existing one.
pub async fn create_thread(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreateThreadRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let caller = claims.sub;

    let (thread, _created) = run_blocking(&state, move |db| {
        ThreadRegistry::new(db).create_or_get(caller, req.participant)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ThreadView::render(ThreadOperation::Create, &thread, caller)),
    ))
}

pub async fn get_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let thread_id = parse_thread_id(&thread_id)?;
    let caller = claims.sub;

    let thread = run_blocking(&state, move |db| ThreadRegistry::new(db).get(thread_id, caller)).await?;

    Ok(Json(ThreadView::render(ThreadOperation::Retrieve, &thread, caller)))
}

pub async fn delete_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let thread_id = parse_thread_id(&thread_id)?;
    let caller = claims.sub;

    run_blocking(&state, move |db| ThreadRegistry::new(db).delete(thread_id, caller)).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /threads/{thread_id}/messages — the whole conversation, oldest first.
pub async fn get_thread_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let thread_id = parse_thread_id(&thread_id)?;
    let caller = claims.sub;

    let messages = run_blocking(&state, move |db| {
        ThreadRegistry::new(db).list_messages(thread_id, caller)
    })
    .await?;

    Ok(Json(messages))
}
