use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{patch, post},
};
use axum_valid::Valid;

use crate::{
    auth::Caller,
    dto::{
        common::Ack,
        team::{ChangeCoachRequest, CreateTeamRequest, TeamCreated, UpdateTeamRequest},
    },
    error::AppError,
    services::team_service,
    state::SharedState,
};

/// Routes covering team administration procedures.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", post(create_team))
        .route("/teams/{id}", patch(update_team))
        .route("/teams/{id}/coach", post(change_coach))
        .route("/teams/{id}/leave", post(leave_team_for_coach))
}

/// Create a team owned by the calling coach.
#[utoipa::path(
    post,
    path = "/teams",
    tag = "teams",
    request_body = CreateTeamRequest,
    responses(
        (status = 200, description = "Team created", body = TeamCreated)
    )
)]
pub async fn create_team(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<CreateTeamRequest>>,
) -> Result<Json<TeamCreated>, AppError> {
    let team_id = team_service::create_team(&state, &caller, payload).await?;
    Ok(Json(TeamCreated {
        success: true,
        team_id,
    }))
}

/// Update a team's profile fields.
#[utoipa::path(
    patch,
    path = "/teams/{id}",
    tag = "teams",
    params(("id" = String, Path, description = "Team identifier")),
    request_body = UpdateTeamRequest,
    responses(
        (status = 200, description = "Team updated", body = Ack)
    )
)]
pub async fn update_team(
    State(state): State<SharedState>,
    Path(team_id): Path<String>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<UpdateTeamRequest>>,
) -> Result<Json<Ack>, AppError> {
    team_service::update_team(&state, &caller, &team_id, payload).await?;
    Ok(Json(Ack::ok()))
}

/// Hand the coach role to another roster member.
#[utoipa::path(
    post,
    path = "/teams/{id}/coach",
    tag = "teams",
    params(("id" = String, Path, description = "Team identifier")),
    request_body = ChangeCoachRequest,
    responses(
        (status = 200, description = "Coach changed", body = Ack)
    )
)]
pub async fn change_coach(
    State(state): State<SharedState>,
    Path(team_id): Path<String>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<ChangeCoachRequest>>,
) -> Result<Json<Ack>, AppError> {
    team_service::change_coach(&state, &caller, &team_id, &payload.member_id).await?;
    Ok(Json(Ack::ok()))
}

/// Disband an empty team by removing its lone coach.
#[utoipa::path(
    post,
    path = "/teams/{id}/leave",
    tag = "teams",
    params(("id" = String, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Coach left the team", body = Ack)
    )
)]
pub async fn leave_team_for_coach(
    State(state): State<SharedState>,
    Path(team_id): Path<String>,
    Caller(caller): Caller,
) -> Result<Json<Ack>, AppError> {
    team_service::leave_team_for_coach(&state, &caller, &team_id).await?;
    Ok(Json(Ack::ok()))
}
