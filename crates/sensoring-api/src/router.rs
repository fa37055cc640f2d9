use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::auth::{require_read, require_write};
use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let read = middleware::from_fn_with_state(state.clone(), require_read);
    let write = middleware::from_fn_with_state(state.clone(), require_write);

    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Detections
        .route(
            "/wastedetection",
            get(handlers::list_detections)
                .route_layer(read.clone())
                .merge(post(handlers::create_detection).route_layer(write.clone())),
        )
        .route(
            "/wastedetection/batch",
            post(handlers::create_detection_batch).route_layer(write),
        )
        .route(
            "/wastedetection/{id}",
            get(handlers::get_detection).route_layer(read),
        )

        .with_state(state)
}
