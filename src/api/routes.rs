use crate::api::{handlers, AppState};
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Build the main router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::landing))
        .route("/search/:term", get(handlers::term_search))
        .route("/geosearch/", get(handlers::geo_search))
        .route("/geosearch/:term", get(handlers::geo_conjunction_search))
        .route("/debug/vars", get(handlers::debug_vars))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
