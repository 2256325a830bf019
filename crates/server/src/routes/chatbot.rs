use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::conversation::{Conversation, Message, UpdateConversation};
use serde::{Deserialize, Serialize};
use services::services::chatbot::{ChatReply, ChatRequest, ChatbotStatus};
use tracing::instrument;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    middleware::{RequestContext, load_conversation_middleware},
};

#[derive(Debug, Default, Deserialize)]
pub struct ConversationListQuery {
    #[serde(default)]
    pub include_archived: bool,
}

#[derive(Debug, Serialize)]
pub struct ConversationDetail {
    pub conversation: Conversation,
    pub messages: Vec<Message>,
}

/// GET /api/chatbot/status
pub async fn status(State(state): State<AppState>) -> ResponseJson<ApiResponse<ChatbotStatus>> {
    ResponseJson(ApiResponse::success(state.chatbot.status()))
}

/// POST /api/chatbot/message
#[instrument(
    name = "chatbot.message",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user.id, conversation_id = ?payload.conversation_id)
)]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<ChatRequest>,
) -> Result<ResponseJson<ApiResponse<ChatReply>>, ApiError> {
    let reply = state
        .chatbot
        .reply(state.pool(), ctx.user.id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(reply)))
}

/// GET /api/chatbot/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<ConversationListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Conversation>>>, ApiError> {
    let conversations =
        Conversation::list_for_user(state.pool(), ctx.user.id, query.include_archived).await?;
    Ok(ResponseJson(ApiResponse::success(conversations)))
}

/// GET /api/chatbot/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Extension(conversation): Extension<Conversation>,
) -> Result<ResponseJson<ApiResponse<ConversationDetail>>, ApiError> {
    let messages = Message::find_by_conversation(state.pool(), conversation.id).await?;
    Ok(ResponseJson(ApiResponse::success(ConversationDetail {
        conversation,
        messages,
    })))
}

/// PATCH /api/chatbot/conversations/{id}
pub async fn update_conversation(
    State(state): State<AppState>,
    Extension(conversation): Extension<Conversation>,
    Json(payload): Json<UpdateConversation>,
) -> Result<ResponseJson<ApiResponse<Conversation>>, ApiError> {
    let updated = Conversation::update(
        state.pool(),
        conversation.id,
        conversation.user_id,
        &payload,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/chatbot/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    Extension(conversation): Extension<Conversation>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected =
        Conversation::delete(state.pool(), conversation.id, conversation.user_id).await?;
    if rows_affected == 0 {
        Err(ApiError::NotFound("conversation"))
    } else {
        Ok(ResponseJson(ApiResponse::success(())))
    }
}

pub fn router(state: &AppState) -> Router<AppState> {
    let conversation_router = Router::new()
        .route(
            "/",
            get(get_conversation)
                .patch(update_conversation)
                .delete(delete_conversation),
        )
        .layer(from_fn_with_state(
            state.clone(),
            load_conversation_middleware,
        ));

    let inner = Router::new()
        .route("/status", get(status))
        .route("/message", post(send_message))
        .route("/conversations", get(list_conversations))
        .nest("/conversations/{conversation_id}", conversation_router);

    Router::new().nest("/chatbot", inner)
}
