//! Verified caller identity extraction.
//!
//! Authentication itself is an external concern: requests arrive with an
//! opaque, already-verified uid attached by the fronting infrastructure.
//! Procedures only need that uid; its absence is an `unauthenticated` error.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

/// Header carrying the verified caller uid.
pub const CALLER_HEADER: &str = "x-caller-uid";

/// Opaque verified caller identity attached to every procedure call.
#[derive(Debug, Clone)]
pub struct Caller(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| Caller(value.to_owned()))
            .ok_or_else(|| {
                AppError::Unauthenticated("the operation requires authentication".into())
            })
    }
}
