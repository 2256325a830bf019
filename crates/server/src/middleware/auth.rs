use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use db::models::user::User;
use tracing::warn;

use crate::{AppState, error::ApiError};

/// The authenticated caller, inserted into request extensions.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub user: User,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let bearer = match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(token)) => token.token().to_owned(),
        None => return ApiError::Unauthorized.into_response(),
    };

    let claims = match state.auth.jwt().decode(&bearer) {
        Ok(claims) => claims,
        Err(error) => {
            warn!(%error, "rejected access token");
            return ApiError::from(error).into_response();
        }
    };

    let user = match User::find_by_id(state.pool(), claims.sub).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("user `{}` missing", claims.sub);
            return ApiError::Unauthorized.into_response();
        }
        Err(error) => return ApiError::from(error).into_response(),
    };

    if !user.is_active {
        return ApiError::Forbidden("account is deactivated").into_response();
    }

    req.extensions_mut().insert(RequestContext { user });
    next.run(req).await
}

/// Must run after [`require_auth`].
pub async fn require_admin(req: Request<Body>, next: Next) -> Response {
    match req.extensions().get::<RequestContext>() {
        Some(ctx) if ctx.user.is_admin() => next.run(req).await,
        Some(ctx) => {
            warn!(user_id = %ctx.user.id, "non-admin tried an admin route");
            ApiError::Forbidden("admin access required").into_response()
        }
        None => ApiError::Unauthorized.into_response(),
    }
}
