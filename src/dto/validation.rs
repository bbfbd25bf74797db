//! Validation helpers for DTOs.

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationError;

static HANDLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9_]{4,30}$").expect("handle pattern"));

static PLACE_LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^https://(www\.)?google\.com/maps/place/[^/]+/@[0-9.-]+,[0-9.-]+,?[0-9]*z/data=.*$",
    )
    .expect("place link pattern")
});

/// Validates a username or team name: lowercase `[a-z0-9_]`, 4 to 30 characters.
pub fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    if !HANDLE_PATTERN.is_match(handle) {
        let mut err = ValidationError::new("handle_format");
        err.message = Some(
            "must be 4-30 characters of lowercase letters, digits, and underscores".into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Validates that a location is a mapping-service place deep link.
pub fn validate_location_link(location: &str) -> Result<(), ValidationError> {
    if !PLACE_LINK_PATTERN.is_match(location) {
        let mut err = ValidationError::new("location_format");
        err.message = Some("must be a maps place link".into());
        return Err(err);
    }
    Ok(())
}
