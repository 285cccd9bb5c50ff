use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers::{ask_handler, create_user_handler, health_handler, hello_handler, hello_name_handler};
use crate::server::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/hello", get(hello_handler))
        .route("/hello/{name}", get(hello_name_handler))
        .route("/create_user", post(create_user_handler))
        .route("/ask", post(ask_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
