use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Matchday Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::teams::create_team,
        crate::routes::teams::update_team,
        crate::routes::teams::change_coach,
        crate::routes::teams::leave_team_for_coach,
        crate::routes::users::create_user,
        crate::routes::users::update_user,
        crate::routes::users::change_account_type,
        crate::routes::matches::update_match,
        crate::routes::matches::cancel_match,
        crate::routes::tournaments::leave_tournament_for_team,
        crate::routes::tournaments::leave_tournament_for_referee,
        crate::routes::tournaments::remove_tournament,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::Ack,
            crate::dto::team::CreateTeamRequest,
            crate::dto::team::UpdateTeamRequest,
            crate::dto::team::ChangeCoachRequest,
            crate::dto::team::TeamCreated,
            crate::dto::user::CreateUserRequest,
            crate::dto::user::UpdateUserRequest,
            crate::dto::user::ChangeAccountTypeRequest,
            crate::dto::match_update::UpdateMatchRequest,
            crate::dto::match_update::CoachPhaseUpdate,
            crate::dto::match_update::RefereePhaseUpdate,
            crate::dto::match_update::RefereeOp,
            crate::dto::match_update::MatchResultInput,
            crate::dto::tournament::LeaveTournamentForTeamRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "teams", description = "Team administration procedures"),
        (name = "users", description = "User account procedures"),
        (name = "matches", description = "Match lifecycle procedures"),
        (name = "tournaments", description = "Tournament roster procedures"),
    )
)]
pub struct ApiDoc;
