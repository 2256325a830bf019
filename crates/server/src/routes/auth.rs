use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::user::User;
use services::services::auth::{AuthSession, ChangePasswordRequest, LoginRequest, RegisterRequest};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware::RequestContext};

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<AuthSession>>), ApiError> {
    let session = state.auth.register(state.pool(), &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(session))))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<ResponseJson<ApiResponse<AuthSession>>, ApiError> {
    let session = state.auth.login(state.pool(), &payload).await?;
    tracing::info!(user_id = %session.user.id, "user logged in");
    Ok(ResponseJson(ApiResponse::success(session)))
}

/// GET /api/auth/me
pub async fn me(Extension(ctx): Extension<RequestContext>) -> ResponseJson<ApiResponse<User>> {
    ResponseJson(ApiResponse::success(ctx.user))
}

/// PUT /api/auth/password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    state
        .auth
        .change_password(state.pool(), &ctx.user, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success_with_message(
        (),
        "password updated",
    )))
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn protected_router() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(me))
        .route("/auth/password", put(change_password))
}
