use axum::Router;

use crate::state::SharedState;

pub mod docs;
pub mod health;
pub mod matches;
pub mod teams;
pub mod tournaments;
pub mod triggers;
pub mod users;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(teams::router())
        .merge(users::router())
        .merge(matches::router())
        .merge(tournaments::router())
        .merge(triggers::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
