use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform success envelope returned by remote procedures.
#[derive(Debug, Serialize, ToSchema)]
pub struct Ack {
    /// Always `true`; failures are reported through the error envelope.
    pub success: bool,
}

impl Ack {
    /// Successful acknowledgement.
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Before/after images delivered by the document store's write observation.
///
/// `before` is absent for creations, `after` for deletions.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::Deserialize<'de>"))]
pub struct DocumentWrite<T> {
    #[serde(default)]
    pub before: Option<T>,
    #[serde(default)]
    pub after: Option<T>,
}
