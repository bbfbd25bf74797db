//! Reactive trigger endpoints invoked by the document store's write
//! observation, not by end users.
//!
//! Trigger handlers have no caller waiting on a response: failures are
//! logged and swallowed, and the endpoints always acknowledge. Follow-up
//! notifications are the only failure signal that reaches users.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use tracing::error;

use crate::{
    dao::models::{MemberEntity, NotificationEntity},
    dto::common::DocumentWrite,
    services::{dispatcher, membership_service},
    state::SharedState,
};

/// Routes consuming document-write observations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/triggers/notifications/{id}", post(on_notification_write))
        .route(
            "/triggers/teams/{team_id}/members/{uid}",
            post(on_member_write),
        )
}

/// Observe a write on a notification document and route the reaction.
pub async fn on_notification_write(
    State(state): State<SharedState>,
    Path(notification_id): Path<String>,
    Json(change): Json<DocumentWrite<NotificationEntity>>,
) -> StatusCode {
    let outcome = dispatcher::on_notification_update(
        &state,
        &notification_id,
        change.before.as_ref(),
        change.after.as_ref(),
    )
    .await;

    if let Err(err) = outcome {
        error!(%notification_id, error = %err, "notification reaction failed");
    }

    StatusCode::NO_CONTENT
}

/// Observe a create/delete on a team's member sub-collection.
pub async fn on_member_write(
    State(state): State<SharedState>,
    Path((team_id, uid)): Path<(String, String)>,
    Json(change): Json<DocumentWrite<MemberEntity>>,
) -> StatusCode {
    let outcome = match (&change.before, &change.after) {
        (None, Some(member)) => {
            membership_service::member_added(&state, &team_id, &uid, member).await
        }
        (Some(_), None) => membership_service::member_removed(&state, &team_id, &uid).await,
        // Updates and empty writes carry no roster change.
        _ => Ok(()),
    };

    if let Err(err) = outcome {
        error!(%team_id, %uid, error = %err, "member reaction failed");
    }

    StatusCode::NO_CONTENT
}
