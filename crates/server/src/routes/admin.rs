//! Admin console endpoints. Every route here runs behind both
//! [`require_auth`](crate::middleware::require_auth) and
//! [`require_admin`](crate::middleware::require_admin).

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use chrono::{Duration, Utc};
use db::models::{
    Page, Pagination,
    api_log::{ApiLog, ApiLogStats},
    conversation::{Conversation, Message},
    journal::JournalEntry,
    mood_entry::MoodEntry,
    user::{UpdateUserAdmin, User, UserRole},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::RequestContext};

const DEFAULT_LOG_LIMIT: i64 = 50;
const MAX_LOG_LIMIT: i64 = 500;
const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub users: i64,
    pub active_users: i64,
    pub journals: i64,
    pub mood_entries: i64,
    pub conversations: i64,
    pub messages: i64,
    pub api_calls_24h: ApiLogStats,
    pub cached_chat_replies: usize,
    pub cached_mood_results: usize,
    pub active_tasbih_counters: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JournalListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiLogQuery {
    pub limit: Option<i64>,
    #[serde(default)]
    pub errors_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct PruneQuery {
    pub older_than_days: i64,
}

#[derive(Debug, Serialize)]
pub struct PruneResult {
    pub removed: u64,
}

/// GET /api/admin/stats
pub async fn stats(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<AdminStats>>, ApiError> {
    let pool = state.pool();
    let stats = AdminStats {
        users: User::count(pool).await?,
        active_users: User::count_active(pool).await?,
        journals: JournalEntry::count(pool).await?,
        mood_entries: MoodEntry::count(pool).await?,
        conversations: Conversation::count(pool).await?,
        messages: Message::count(pool).await?,
        api_calls_24h: ApiLog::stats_since(pool, Utc::now() - Duration::hours(24)).await?,
        cached_chat_replies: state.chatbot.cached_replies(),
        cached_mood_results: state.mood.analyzer().cached_results(),
        active_tasbih_counters: state.tasbih.active_counters(),
    };
    Ok(ResponseJson(ApiResponse::success(stats)))
}

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<ResponseJson<ApiResponse<Page<User>>>, ApiError> {
    let pagination = Pagination {
        page: query.page,
        limit: query.limit,
    };
    let page = User::list(state.pool(), query.search.as_deref(), &pagination).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

/// PATCH /api/admin/users/{id}
#[instrument(
    name = "admin.update_user",
    skip(state, ctx, payload),
    fields(admin_id = %ctx.user.id, user_id = %user_id)
)]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserAdmin>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    if user_id == ctx.user.id {
        if payload.role.is_some_and(|role| role != UserRole::Admin) {
            return Err(ApiError::BadRequest(
                "admins cannot remove their own admin role".to_string(),
            ));
        }
        if payload.is_active == Some(false) {
            return Err(ApiError::BadRequest(
                "admins cannot deactivate their own account".to_string(),
            ));
        }
    }

    let user = User::update_admin(state.pool(), user_id, &payload).await?;
    tracing::info!(role = %user.role, is_active = user.is_active, "admin updated user");
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// DELETE /api/admin/users/{id}
#[instrument(
    name = "admin.delete_user",
    skip(state, ctx),
    fields(admin_id = %ctx.user.id, user_id = %user_id)
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(user_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if user_id == ctx.user.id {
        return Err(ApiError::BadRequest(
            "admins cannot delete their own account".to_string(),
        ));
    }
    if User::delete(state.pool(), user_id).await? == 0 {
        return Err(ApiError::NotFound("user"));
    }
    tracing::info!("admin deleted user");
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/admin/journals
pub async fn list_journals(
    State(state): State<AppState>,
    Query(query): Query<JournalListQuery>,
) -> Result<ResponseJson<ApiResponse<Page<JournalEntry>>>, ApiError> {
    let pagination = Pagination {
        page: query.page,
        limit: query.limit,
    };
    let page = JournalEntry::list_all(state.pool(), query.include_deleted, &pagination).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

/// DELETE /api/admin/journals/{id}
pub async fn delete_journal(
    State(state): State<AppState>,
    Path(journal_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    MoodEntry::delete_for_journal(state.pool(), journal_id).await?;
    if JournalEntry::hard_delete(state.pool(), journal_id).await? == 0 {
        return Err(ApiError::NotFound("journal entry"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

/// GET /api/admin/api-logs
pub async fn list_api_logs(
    State(state): State<AppState>,
    Query(query): Query<ApiLogQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ApiLog>>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LOG_LIMIT)
        .clamp(1, MAX_LOG_LIMIT);
    let logs = ApiLog::recent(state.pool(), limit, query.errors_only).await?;
    Ok(ResponseJson(ApiResponse::success(logs)))
}

/// DELETE /api/admin/api-logs
pub async fn prune_api_logs(
    State(state): State<AppState>,
    Query(query): Query<PruneQuery>,
) -> Result<ResponseJson<ApiResponse<PruneResult>>, ApiError> {
    if query.older_than_days < 1 {
        return Err(ApiError::BadRequest(
            "older_than_days must be at least 1".to_string(),
        ));
    }
    let cutoff = Utc::now() - Duration::days(query.older_than_days.min(MAX_RETENTION_DAYS));
    let removed = ApiLog::prune_before(state.pool(), cutoff).await?;
    tracing::info!(removed, older_than_days = query.older_than_days, "pruned api logs");
    Ok(ResponseJson(ApiResponse::success(PruneResult { removed })))
}

pub fn router() -> Router<AppState> {
    let inner = Router::new()
        .route("/stats", get(stats))
        .route("/users", get(list_users))
        .route("/users/{user_id}", delete(delete_user).patch(update_user))
        .route("/journals", get(list_journals))
        .route("/journals/{journal_id}", delete(delete_journal))
        .route("/api-logs", get(list_api_logs).delete(prune_api_logs));

    Router::new().nest("/admin", inner)
}
