use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::dto::validation::validate_handle;

/// Payload for the `create_team` procedure.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTeamRequest {
    /// Unique team handle, lowercase `[a-z0-9_]{4,30}`.
    pub team_name: String,
    pub team_logo: String,
    pub team_description: String,
}

impl Validate for CreateTeamRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_handle(&self.team_name) {
            errors.add("team_name", e);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload for the `update_team` procedure. All fields optional, at least one required.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTeamRequest {
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub team_logo: Option<String>,
    #[serde(default)]
    pub team_description: Option<String>,
}

impl UpdateTeamRequest {
    /// Whether no field was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.team_name.is_none() && self.team_logo.is_none() && self.team_description.is_none()
    }
}

impl Validate for UpdateTeamRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref name) = self.team_name {
            if let Err(e) = validate_handle(name) {
                errors.add("team_name", e);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload for the `change_coach` procedure (team id comes from the path).
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChangeCoachRequest {
    /// Uid of the roster member being promoted to coach.
    #[validate(length(min = 1))]
    pub member_id: String,
}

/// Response of the `create_team` procedure.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamCreated {
    /// Always `true`.
    pub success: bool,
    /// Id generated for the new team.
    pub team_id: String,
}
