use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dao::models::{AccountType, Gender},
    dto::validation::validate_handle,
};

/// Payload for the `create_user` procedure.
///
/// The username is normalized by the service rather than rejected, so no
/// pattern is enforced at the boundary.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1))]
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

/// Payload for the `update_user` procedure. All fields optional, at least one required.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// Unix milliseconds.
    #[serde(default)]
    pub birthday_ms: Option<i64>,
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone_numbers: Option<Vec<String>>,
}

impl UpdateUserRequest {
    /// Whether no field was supplied at all.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.bio.is_none()
            && self.avatar.is_none()
            && self.birthday_ms.is_none()
            && self.gender.is_none()
            && self.address.is_none()
            && self.phone_numbers.is_none()
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref username) = self.username {
            if let Err(e) = validate_handle(username) {
                errors.add("username", e);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload for the `change_account_type` procedure.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct ChangeAccountTypeRequest {
    /// Target account type.
    #[schema(value_type = String)]
    pub account_type: AccountType,
}
