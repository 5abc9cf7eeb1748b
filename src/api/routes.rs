use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main router: API routes plus the frontend bundle
///
/// Paths that match no route are served from the static root; `ServeDir`
/// answers 404 for anything resolving outside it.
pub fn create_router(state: AppState) -> Router {
    let frontend = ServeDir::new(&state.static_dir);
    let index = ServeFile::new(state.index_path());

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/search", get(handlers::search))
        .route("/trending", get(handlers::trending))
        .route_service("/", index)
        .fallback_service(frontend)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
