use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Payload for the `leave_tournament_for_team` procedure
/// (tournament id comes from the path).
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct LeaveTournamentForTeamRequest {
    /// Id of the team leaving the tournament.
    #[validate(length(min = 1))]
    pub team_id: String,
}
