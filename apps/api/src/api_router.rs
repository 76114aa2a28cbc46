use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;


pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route(
            "/api/access-requests",
            post(handlers::access_requests::submit_access_request_handler),
        )
        .route(
            "/api/access-requests/{request_id}",
            get(handlers::access_requests::get_access_request_handler)
                .delete(handlers::access_requests::cancel_access_request_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
