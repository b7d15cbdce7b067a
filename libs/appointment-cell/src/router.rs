// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::get,
    Router,
};

use crate::handlers;
use crate::state::AppState;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/{agent_id}/opening-hours",
            get(handlers::get_opening_hours).put(handlers::set_opening_hours),
        )
        .route("/{agent_id}/availability", get(handlers::get_availability))
        .route(
            "/{agent_id}/appointments",
            get(handlers::list_appointments).post(handlers::book_appointment),
        )
        .with_state(state)
}
