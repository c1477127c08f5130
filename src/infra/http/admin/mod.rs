mod posts;
mod state;

pub use state::AdminState;

use axum::{Router, middleware, routing::get};

use crate::presentation::admin::views::ADMIN_INDEX_PATH;

use super::{RouterState, auth::require_admin};

/// Admin routes, all behind the session gate. Create and update share one handler.
pub fn build_admin_router(state: AdminState) -> Router<RouterState> {
    Router::new()
        .route(ADMIN_INDEX_PATH, get(posts::admin_index))
        .route(
            "/posts/admin/{slug}",
            get(posts::admin_post_editor).post(posts::admin_post_save),
        )
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}
