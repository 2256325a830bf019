//! Load path-addressed records owned by the caller into request extensions.
//!
//! Records that exist but belong to someone else are reported as missing.

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::models::{conversation::Conversation, journal::JournalEntry};
use uuid::Uuid;

use super::auth::RequestContext;
use crate::{AppState, error::ApiError};

fn caller(request: &Request) -> Result<Uuid, ApiError> {
    request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.user.id)
        .ok_or(ApiError::Unauthorized)
}

pub async fn load_journal_middleware(
    State(state): State<AppState>,
    Path(journal_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match caller(&request) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match JournalEntry::find_for_user(state.pool(), journal_id, user_id).await {
        Ok(Some(entry)) => {
            request.extensions_mut().insert(entry);
            next.run(request).await
        }
        Ok(None) => {
            tracing::debug!(%journal_id, %user_id, "journal entry not found");
            ApiError::NotFound("journal entry").into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch journal entry {}: {}", journal_id, e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn load_conversation_middleware(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
    mut request: Request,
    next: Next,
) -> Response {
    let user_id = match caller(&request) {
        Ok(id) => id,
        Err(e) => return e.into_response(),
    };

    match Conversation::find_for_user(state.pool(), conversation_id, user_id).await {
        Ok(Some(conversation)) => {
            request.extensions_mut().insert(conversation);
            next.run(request).await
        }
        Ok(None) => ApiError::NotFound("conversation").into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch conversation {}: {}", conversation_id, e);
            ApiError::from(e).into_response()
        }
    }
}
