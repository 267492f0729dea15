//! HTTP router for the callback service.
//!
//! - `/`         — liveness text
//! - `/callback` — authorization-code landing page
//! - `/check`    — "does this user have a stored token?"

pub mod routes;

use crate::SharedState;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::routes(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
