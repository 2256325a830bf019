use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::mood_entry::{Emotion, MoodEntry};
use serde::{Deserialize, Serialize};
use services::services::mood::{
    CreateMoodRequest, DEFAULT_WINDOW_DAYS, MoodAnalysis, MoodInsights, MoodServiceError,
};
use utils::response::ApiResponse;
use tracing::instrument;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::RequestContext};

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

impl WindowQuery {
    fn days(&self) -> i64 {
        self.days.unwrap_or(DEFAULT_WINDOW_DAYS)
    }
}

#[derive(Debug, Serialize)]
pub struct EmotionInfo {
    pub emotion: Emotion,
    pub valence: i8,
}

/// POST /api/mood/analyze
pub async fn analyze(
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<ResponseJson<ApiResponse<MoodAnalysis>>, ApiError> {
    let analysis = state
        .mood
        .analyze(&payload.text)
        .map_err(MoodServiceError::from)?;
    Ok(ResponseJson(ApiResponse::success(analysis)))
}

/// GET /api/mood/emotions
pub async fn list_emotions() -> ResponseJson<ApiResponse<Vec<EmotionInfo>>> {
    let emotions = Emotion::ALL
        .into_iter()
        .map(|emotion| EmotionInfo {
            emotion,
            valence: emotion.valence(),
        })
        .collect();
    ResponseJson(ApiResponse::success(emotions))
}

/// POST /api/mood
#[instrument(name = "mood.record", skip(state, ctx, payload), fields(user_id = %ctx.user.id))]
pub async fn record_mood(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateMoodRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<MoodEntry>>), ApiError> {
    let entry = state.mood.record(state.pool(), ctx.user.id, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(entry))))
}

/// GET /api/mood
pub async fn list_moods(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<WindowQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<MoodEntry>>>, ApiError> {
    let entries = state
        .mood
        .list(state.pool(), ctx.user.id, query.days())
        .await?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

/// GET /api/mood/stats
pub async fn mood_stats(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<WindowQuery>,
) -> Result<ResponseJson<ApiResponse<MoodInsights>>, ApiError> {
    let insights = state
        .mood
        .insights(state.pool(), ctx.user.id, query.days())
        .await?;
    Ok(ResponseJson(ApiResponse::success(insights)))
}

/// DELETE /api/mood/{id}
pub async fn delete_mood(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state.mood.delete(state.pool(), ctx.user.id, id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    let inner = Router::new()
        .route("/", get(list_moods).post(record_mood))
        .route("/analyze", post(analyze))
        .route("/emotions", get(list_emotions))
        .route("/stats", get(mood_stats))
        .route("/{id}", delete(delete_mood));

    Router::new().nest("/mood", inner)
}
