use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{patch, post},
};
use axum_valid::Valid;

use crate::{
    auth::Caller,
    dto::{common::Ack, match_update::UpdateMatchRequest},
    error::AppError,
    services::match_service,
    state::SharedState,
};

/// Routes covering the match lifecycle procedures.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches/{id}", patch(update_match))
        .route("/matches/{id}/cancel", post(cancel_match))
}

/// Mutate a match: a schedule candidate from a coach, or a typed operation
/// from the agreed referee, depending on the match's current status.
#[utoipa::path(
    patch,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = String, Path, description = "Match identifier")),
    request_body = UpdateMatchRequest,
    responses(
        (status = 200, description = "Match updated", body = Ack)
    )
)]
pub async fn update_match(
    State(state): State<SharedState>,
    Path(match_id): Path<String>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<UpdateMatchRequest>>,
) -> Result<Json<Ack>, AppError> {
    match_service::update_match(&state, &caller, &match_id, payload).await?;
    Ok(Json(Ack::ok()))
}

/// Cancel a match on behalf of one of its coaches.
#[utoipa::path(
    post,
    path = "/matches/{id}/cancel",
    tag = "matches",
    params(("id" = String, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Match cancelled", body = Ack)
    )
)]
pub async fn cancel_match(
    State(state): State<SharedState>,
    Path(match_id): Path<String>,
    Caller(caller): Caller,
) -> Result<Json<Ack>, AppError> {
    match_service::cancel_match(&state, &caller, &match_id).await?;
    Ok(Json(Ack::ok()))
}
