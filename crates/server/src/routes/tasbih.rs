use axum::{
    Extension, Json, Router,
    body::Bytes,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use serde::Deserialize;
use services::services::tasbih::{TasbihCounter, TasbihSettings};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware::RequestContext};

#[derive(Debug, Deserialize)]
pub struct IncrementRequest {
    #[serde(default = "default_step")]
    pub step: u32,
}

fn default_step() -> u32 {
    1
}

/// GET /api/tasbih
pub async fn get_counter(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ResponseJson<ApiResponse<TasbihCounter>> {
    ResponseJson(ApiResponse::success(state.tasbih.get(ctx.user.id)))
}

/// POST /api/tasbih/increment
///
/// The body is optional; a bare POST counts one.
pub async fn increment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    body: Bytes,
) -> Result<ResponseJson<ApiResponse<TasbihCounter>>, ApiError> {
    let step = if body.iter().all(u8::is_ascii_whitespace) {
        default_step()
    } else {
        serde_json::from_slice::<IncrementRequest>(&body)
            .map_err(|e| ApiError::BadRequest(format!("invalid increment body: {e}")))?
            .step
    };
    let counter = state.tasbih.increment(ctx.user.id, step)?;
    Ok(ResponseJson(ApiResponse::success(counter)))
}

/// POST /api/tasbih/reset
pub async fn reset(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> ResponseJson<ApiResponse<TasbihCounter>> {
    ResponseJson(ApiResponse::success(state.tasbih.reset(ctx.user.id)))
}

/// PUT /api/tasbih/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<TasbihSettings>,
) -> Result<ResponseJson<ApiResponse<TasbihCounter>>, ApiError> {
    let counter = state.tasbih.configure(ctx.user.id, &payload)?;
    Ok(ResponseJson(ApiResponse::success(counter)))
}

pub fn router() -> Router<AppState> {
    let inner = Router::new()
        .route("/", get(get_counter))
        .route("/increment", post(increment))
        .route("/reset", post(reset))
        .route("/settings", put(update_settings));

    Router::new().nest("/tasbih", inner)
}
