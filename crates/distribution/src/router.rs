use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{copy, delete, download, health, upload, AppState};

/// Builds the `/storages` HTTP surface. Mounted by the root binary under its own prefix if
/// desired; routes are absolute here to match the on-disk layout 1:1.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/storages/copy/{*path}", post(copy))
        .route(
            "/storages/{storage}/{repo}/{*path}",
            put(upload).get(download).delete(delete),
        )
        .with_state(state)
}
