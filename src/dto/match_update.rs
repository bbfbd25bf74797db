use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Polymorphic `update_match` payload.
///
/// The shape depends on the match's current status: coaches submit schedule
/// candidates while negotiation is open, the agreed referee submits typed
/// operations once the match is pending or underway. The variant is resolved
/// structurally here and checked against the actual status by the engine.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum UpdateMatchRequest {
    /// Referee-phase operation (discriminated by its `type` field).
    Referee(RefereePhaseUpdate),
    /// Coach-phase schedule candidate.
    Coach(CoachPhaseUpdate),
}

impl Validate for UpdateMatchRequest {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        // Field-level validation happens in the engine, where the match
        // status decides which shape is legal.
        Ok(())
    }
}

/// Schedule candidate a coach proposes while the match is in `coachs_edit`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CoachPhaseUpdate {
    /// Proposed kick-off instant, unix milliseconds; must be in the future.
    pub start_in_ms: i64,
    /// Maps place deep link for the venue.
    pub location: String,
    /// Uid of the proposed referee (account type `refree`).
    pub referee_id: String,
}

/// Operation the agreed referee applies from `pending` or `in_progress`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefereePhaseUpdate {
    /// Operation discriminator.
    #[serde(rename = "type")]
    pub op: RefereeOp,
    /// Required for `edit_result`.
    #[serde(default)]
    pub result: Option<MatchResultInput>,
}

/// Referee-phase operation kinds.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema, PartialEq, Eq)]
pub enum RefereeOp {
    /// Overwrite both team scores.
    #[serde(rename = "edit_result")]
    EditResult,
    /// Cancel the match (pending only).
    #[serde(rename = "cancel_match")]
    CancelMatch,
    /// Close the match and publish the outcome.
    #[serde(rename = "end_match")]
    EndMatch,
    /// Start play, zeroing both scores.
    #[serde(rename = "set_in_progress")]
    SetInProgress,
}

/// Numeric result for both sides.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct MatchResultInput {
    /// Challenger side score.
    pub team1: i64,
    /// Challenged side score.
    pub team2: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referee_shape_takes_priority() {
        let parsed: UpdateMatchRequest =
            serde_json::from_str(r#"{"type": "set_in_progress"}"#).unwrap();
        assert!(matches!(
            parsed,
            UpdateMatchRequest::Referee(RefereePhaseUpdate {
                op: RefereeOp::SetInProgress,
                result: None,
            })
        ));
    }

    #[test]
    fn result_payload_parses() {
        let parsed: UpdateMatchRequest =
            serde_json::from_str(r#"{"type": "edit_result", "result": {"team1": 2, "team2": 1}}"#)
                .unwrap();
        let UpdateMatchRequest::Referee(update) = parsed else {
            panic!("expected referee payload");
        };
        let result = update.result.unwrap();
        assert_eq!((result.team1, result.team2), (2, 1));
    }

    #[test]
    fn coach_shape_requires_all_fields() {
        let parsed: UpdateMatchRequest = serde_json::from_str(
            r#"{"start_in_ms": 1893456000000, "location": "https://google.com/maps/place/X/@1,2,3z/data=a", "referee_id": "ref-1"}"#,
        )
        .unwrap();
        assert!(matches!(parsed, UpdateMatchRequest::Coach(_)));

        let missing: Result<UpdateMatchRequest, _> =
            serde_json::from_str(r#"{"start_in_ms": 1893456000000}"#);
        assert!(missing.is_err());
    }
}
