//! HTTP route trees for the admin and player surfaces.

use axum::Router;

use crate::state::SharedState;

pub mod admin;
pub mod health;
pub mod play;

/// Compose all route trees, wiring in shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(admin::router())
        .merge(play::router())
        .with_state(state)
}
