use tracing::debug;

use crate::{
    dao::models::{NotificationAction, NotificationEntity, NotificationKind},
    error::ServiceError,
    services::{JoinOrigin, match_service, membership_service, tournament_service},
    state::SharedState,
};

/// React to a write on a notification document.
///
/// Strictly edge-triggered: business logic fires only when the before-image
/// exists with `action` unset and the after-image carries a terminal action.
/// Replays, creations, deletions, and any later field update on the same
/// document fall through without effect, which is the only at-most-once
/// guarantee in the system.
pub async fn on_notification_update(
    state: &SharedState,
    notification_id: &str,
    before: Option<&NotificationEntity>,
    after: Option<&NotificationEntity>,
) -> Result<(), ServiceError> {
    let Some(before) = before else {
        return Ok(());
    };
    let Some(after) = after else {
        return Ok(());
    };
    if before.action.is_some() {
        debug!(notification_id, "notification already actioned; ignoring write");
        return Ok(());
    }
    let Some(action) = after.action else {
        return Ok(());
    };

    match (after.kind, action) {
        (NotificationKind::RequestToJoinTeam, NotificationAction::Accept) => {
            // from: the requesting user, to: the team.
            membership_service::join_team(state, &after.from_id, &after.to_id, JoinOrigin::Request)
                .await
        }
        (NotificationKind::InviteToTeam, NotificationAction::Accept) => {
            // from: the inviting team, to: the invited user.
            membership_service::join_team(state, &after.to_id, &after.from_id, JoinOrigin::Invite)
                .await
        }
        (NotificationKind::MatchChallenge, NotificationAction::Accept) => {
            match_service::create_from_challenge(
                state,
                notification_id,
                &after.from_id,
                &after.to_id,
            )
            .await
        }
        (
            NotificationKind::RefereeInvite,
            NotificationAction::Accept | NotificationAction::Decline,
        ) => {
            // from: the match, to: the invited referee.
            match_service::referee_response(state, &after.from_id, &after.to_id, action).await
        }
        (NotificationKind::RequestToJoinTournament, NotificationAction::Accept) => {
            tournament_service::join_tournament(
                state,
                &after.from_id,
                &after.to_id,
                JoinOrigin::Request,
            )
            .await
        }
        (NotificationKind::InviteToTournament, NotificationAction::Accept) => {
            tournament_service::join_tournament(
                state,
                &after.to_id,
                &after.from_id,
                JoinOrigin::Invite,
            )
            .await
        }
        (NotificationKind::InviteRefereeToTournament, NotificationAction::Accept) => {
            tournament_service::add_referee(state, &after.from_id, &after.to_id).await
        }
        _ => Ok(()),
    }
}
