pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use lc_cost::{MachineProfile, RateBook};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Build the Axum application. Stateless beyond the rate book and machine
/// profile configured at startup: every request carries its own nesting
/// result and job overrides, so there is no session store to sweep.
pub fn build_app(rate_book: RateBook, machine_profile: MachineProfile) -> Router {
    let state = Arc::new(AppState::new(rate_book, machine_profile));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    routes::api_router().layer(cors).with_state(state)
}
