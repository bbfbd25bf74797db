use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, post},
};
use axum_valid::Valid;

use crate::{
    auth::Caller,
    dto::{common::Ack, tournament::LeaveTournamentForTeamRequest},
    error::AppError,
    services::tournament_service,
    state::SharedState,
};

/// Routes covering tournament roster procedures.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/tournaments/{id}/leave-team", post(leave_tournament_for_team))
        .route(
            "/tournaments/{id}/leave-referee",
            post(leave_tournament_for_referee),
        )
        .route("/tournaments/{id}", delete(remove_tournament))
}

/// Withdraw a team from a pending tournament, on behalf of its coach.
#[utoipa::path(
    post,
    path = "/tournaments/{id}/leave-team",
    tag = "tournaments",
    params(("id" = String, Path, description = "Tournament identifier")),
    request_body = LeaveTournamentForTeamRequest,
    responses(
        (status = 200, description = "Team left the tournament", body = Ack)
    )
)]
pub async fn leave_tournament_for_team(
    State(state): State<SharedState>,
    Path(tournament_id): Path<String>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<LeaveTournamentForTeamRequest>>,
) -> Result<Json<Ack>, AppError> {
    tournament_service::leave_for_team(&state, &caller, &tournament_id, &payload.team_id).await?;
    Ok(Json(Ack::ok()))
}

/// Withdraw the calling referee from a pending tournament.
#[utoipa::path(
    post,
    path = "/tournaments/{id}/leave-referee",
    tag = "tournaments",
    params(("id" = String, Path, description = "Tournament identifier")),
    responses(
        (status = 200, description = "Referee left the tournament", body = Ack)
    )
)]
pub async fn leave_tournament_for_referee(
    State(state): State<SharedState>,
    Path(tournament_id): Path<String>,
    Caller(caller): Caller,
) -> Result<Json<Ack>, AppError> {
    tournament_service::leave_for_referee(&state, &caller, &tournament_id).await?;
    Ok(Json(Ack::ok()))
}

/// Remove a pending tournament, on behalf of its manager.
#[utoipa::path(
    delete,
    path = "/tournaments/{id}",
    tag = "tournaments",
    params(("id" = String, Path, description = "Tournament identifier")),
    responses(
        (status = 200, description = "Tournament removed", body = Ack)
    )
)]
pub async fn remove_tournament(
    State(state): State<SharedState>,
    Path(tournament_id): Path<String>,
    Caller(caller): Caller,
) -> Result<Json<Ack>, AppError> {
    tournament_service::remove_tournament(&state, &caller, &tournament_id).await?;
    Ok(Json(Ack::ok()))
}
