use axum::{
    Router,
    http::{Request, StatusCode, header::HeaderName},
    middleware,
    response::{IntoResponse, Json as ResponseJson},
    routing::get,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, field};
use utils::response::ApiResponse;

use crate::{
    AppState,
    middleware::{require_admin, require_auth},
};

pub mod admin;
pub mod auth;
pub mod chatbot;
pub mod health;
pub mod journals;
pub mod mood;
pub mod tasbih;

async fn api_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        ResponseJson(ApiResponse::<()>::error("route not found")),
    )
}

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .and_then(|id| id.header_value().to_str().ok());
            let span = tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = field::Empty
            );
            if let Some(request_id) = request_id {
                span.record("request_id", field::display(request_id));
            }
            span
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR));

    let public = Router::<AppState>::new()
        .route("/health", get(health::health_check))
        .merge(auth::public_router());

    let admin = admin::router().layer(middleware::from_fn(require_admin));

    let protected = Router::<AppState>::new()
        .merge(auth::protected_router())
        .merge(journals::router(&state))
        .merge(mood::router())
        .merge(chatbot::router(&state))
        .merge(tasbih::router())
        .merge(admin)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let api = Router::<AppState>::new()
        .merge(public)
        .merge(protected)
        .fallback(api_not_found);

    let mut app = Router::<AppState>::new().nest("/api", api);

    if let Some(static_dir) = &state.config.static_dir {
        let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));
        app = app.fallback_service(spa);
    }

    app.layer(CorsLayer::permissive())
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            MakeRequestUuid {},
        ))
        .with_state(state)
}
