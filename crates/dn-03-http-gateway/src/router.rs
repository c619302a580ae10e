//! Route table and middleware stack.

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Upper bound on one multipart request body.
pub const MAX_REQUEST_BYTES: usize = 100 * 1024 * 1024;

/// Build the gateway router. CORS is open to any origin: upload clients
/// are browsers on arbitrary sites.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(liveness))
        .route("/upload/:size", post(handlers::upload))
        .route("/copy/:size", post(handlers::copy))
        .route("/backup/:size", post(handlers::backup))
        .route(
            "/download/:address/:file_key/:signature",
            get(handlers::download),
        )
        .route("/update_fs/:address/:signed_fsys", post(handlers::update_fs))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `GET /`: the liveness probe peers issue before forwarding overflow.
async fn liveness() -> &'static str {
    "OK"
}
