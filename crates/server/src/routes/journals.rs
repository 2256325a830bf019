use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    Page, Pagination,
    journal::{
        CreateJournalEntry, EntryType, JournalEntry, JournalFilter, TagCount, UpdateJournalEntry,
    },
    mood_entry::MoodEntry,
};
use serde::Deserialize;
use tracing::instrument;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::ApiError,
    middleware::{RequestContext, load_journal_middleware},
};

#[derive(Debug, Default, Deserialize)]
pub struct JournalListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub tag: Option<String>,
    pub search: Option<String>,
    pub entry_type: Option<EntryType>,
}

/// Analyze the entry's text and return it with the stored mood. Analysis
/// problems never fail the write itself.
async fn analyze_and_reload(state: &AppState, entry: JournalEntry) -> JournalEntry {
    if let Err(e) = state.mood.analyze_journal(state.pool(), &entry).await {
        tracing::warn!(journal_id = %entry.id, error = %e, "journal mood analysis failed");
        return entry;
    }
    match JournalEntry::find_for_user(state.pool(), entry.id, entry.user_id).await {
        Ok(Some(fresh)) => fresh,
        _ => entry,
    }
}

/// GET /api/journals
pub async fn list_journals(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<JournalListQuery>,
) -> Result<ResponseJson<ApiResponse<Page<JournalEntry>>>, ApiError> {
    let pagination = Pagination {
        page: query.page,
        limit: query.limit,
    };
    let filter = JournalFilter {
        tag: query.tag,
        search: query.search,
        entry_type: query.entry_type,
    };
    let page = JournalEntry::list_for_user(state.pool(), ctx.user.id, &filter, &pagination).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

/// POST /api/journals
#[instrument(name = "journals.create", skip(state, ctx, payload), fields(user_id = %ctx.user.id))]
pub async fn create_journal(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateJournalEntry>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<JournalEntry>>), ApiError> {
    let entry = JournalEntry::create(state.pool(), ctx.user.id, &payload).await?;
    tracing::debug!(journal_id = %entry.id, "created journal entry");
    let entry = analyze_and_reload(&state, entry).await;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(entry))))
}

/// GET /api/journals/tags
pub async fn list_tags(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<ResponseJson<ApiResponse<Vec<TagCount>>>, ApiError> {
    let tags = JournalEntry::tag_counts(state.pool(), ctx.user.id).await?;
    Ok(ResponseJson(ApiResponse::success(tags)))
}

/// GET /api/journals/{id}
pub async fn get_journal(
    Extension(entry): Extension<JournalEntry>,
) -> ResponseJson<ApiResponse<JournalEntry>> {
    ResponseJson(ApiResponse::success(entry))
}

/// PUT /api/journals/{id}
#[instrument(
    name = "journals.update",
    skip(state, entry, payload),
    fields(user_id = %entry.user_id, journal_id = %entry.id)
)]
pub async fn update_journal(
    State(state): State<AppState>,
    Extension(entry): Extension<JournalEntry>,
    Json(payload): Json<UpdateJournalEntry>,
) -> Result<ResponseJson<ApiResponse<JournalEntry>>, ApiError> {
    let updated = JournalEntry::update(state.pool(), entry.id, entry.user_id, &payload).await?;
    let updated = if updated.content != entry.content {
        analyze_and_reload(&state, updated).await
    } else {
        updated
    };
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/journals/{id}
pub async fn delete_journal(
    State(state): State<AppState>,
    Extension(entry): Extension<JournalEntry>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = JournalEntry::soft_delete(state.pool(), entry.id, entry.user_id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("journal entry"));
    }
    MoodEntry::delete_for_journal(state.pool(), entry.id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let journal_router = Router::new()
        .route(
            "/",
            get(get_journal).put(update_journal).delete(delete_journal),
        )
        .layer(from_fn_with_state(state.clone(), load_journal_middleware));

    let inner = Router::new()
        .route("/", get(list_journals).post(create_journal))
        .route("/tags", get(list_tags))
        .nest("/{journal_id}", journal_router);

    Router::new().nest("/journals", inner)
}
