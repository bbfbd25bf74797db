use std::time::{Duration, SystemTime};

use crate::{
    dao::{
        models::{
            AccountType, MatchEntity, MatchKind, MatchStatus, MemberRole, NotificationAction,
            NotificationEntity, NotificationKind, RefereeSlot, TeamEntity, TeamSlot,
        },
        record_store::RecordStore,
    },
    dto::{
        format_system_time,
        match_update::{CoachPhaseUpdate, RefereeOp, RefereePhaseUpdate, UpdateMatchRequest},
        validation::validate_location_link,
    },
    error::ServiceError,
    services::notify,
    state::{
        SharedState,
        match_machine::{MatchEvent, compute_transition},
    },
};

/// Whether `uid` holds the coach role on the given team's roster.
async fn is_coach(
    store: &dyn RecordStore,
    team_id: &str,
    uid: &str,
) -> Result<bool, ServiceError> {
    Ok(store
        .find_member(team_id, uid)
        .await?
        .is_some_and(|member| member.role == MemberRole::Coach))
}

/// Create a match from an accepted mutual challenge notification.
///
/// Dispatcher delegate. The match id is the challenge notification id, which
/// makes replays idempotent: an existing match means the work is already
/// done. Missing teams abort with an informational decline instead of an
/// error, since nobody is waiting on a trigger's response.
pub async fn create_from_challenge(
    state: &SharedState,
    challenge_id: &str,
    from_id: &str,
    to_id: &str,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    if from_id == to_id {
        notify::send_info(
            store.as_ref(),
            to_id,
            from_id,
            "Match Challenge Declined",
            "You can't challenge your own team.",
        )
        .await?;
        return Ok(());
    }

    if store.find_match(challenge_id).await?.is_some() {
        return Ok(());
    }

    let team1 = store.find_team(from_id).await?;
    let team2 = store.find_team(to_id).await?;
    let Some(team1) = team1 else {
        notify::send_info(
            store.as_ref(),
            to_id,
            to_id,
            "Match Challenge Declined",
            "The challenger team no longer exists.",
        )
        .await?;
        return Ok(());
    };
    let Some(team2) = team2 else {
        notify::send_info(
            store.as_ref(),
            from_id,
            from_id,
            "Match Challenge Declined",
            "The challenged team no longer exists.",
        )
        .await?;
        return Ok(());
    };

    let now = SystemTime::now();
    store
        .save_match(MatchEntity::new_challenge(
            challenge_id.to_owned(),
            from_id.to_owned(),
            to_id.to_owned(),
            now,
        ))
        .await?;

    notify::send_info(
        store.as_ref(),
        to_id,
        from_id,
        "Match Challenge Accepted",
        format!("{} has accepted your match challenge.", team2.team_name),
    )
    .await?;
    notify::send_info(
        store.as_ref(),
        from_id,
        to_id,
        "Match Created",
        format!("The match with team {} has been created.", team1.team_name),
    )
    .await?;

    Ok(())
}

/// Apply the invited referee's accept/decline to a `refree_waiting` match.
///
/// Dispatcher delegate. Every unmet prerequisite is a silent no-op: the
/// invitation may be stale (match already reset, referee swapped out) and a
/// trigger has no caller to report to.
pub async fn referee_response(
    state: &SharedState,
    match_id: &str,
    referee_id: &str,
    action: NotificationAction,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(user) = store.find_user(referee_id).await? else {
        return Ok(());
    };
    if user.account_type != AccountType::Referee {
        return Ok(());
    }
    let Some(mut m) = store.find_match(match_id).await? else {
        return Ok(());
    };
    if m.referee.id.as_deref() != Some(referee_id) {
        return Ok(());
    }
    if m.status != MatchStatus::RefereeWaiting {
        return Ok(());
    }

    match action {
        NotificationAction::Decline => {
            m.referee = RefereeSlot::default();
            m.status = compute_transition(m.status, MatchEvent::RefereeDeclined)?;
            m.updated_at = SystemTime::now();
            let (team1_id, team2_id) = (m.team1.id.clone(), m.team2.id.clone());
            store.save_match(m).await?;

            for team_id in [team1_id, team2_id] {
                notify::send_info(
                    store.as_ref(),
                    match_id,
                    team_id,
                    "Referee Invite Declined",
                    "The referee has declined the invite.",
                )
                .await?;
            }
        }
        NotificationAction::Accept => {
            m.referee.agreed = true;
            m.status = compute_transition(m.status, MatchEvent::RefereeAccepted)?;
            m.updated_at = SystemTime::now();
            let (team1_id, team2_id) = (m.team1.id.clone(), m.team2.id.clone());
            store.save_match(m).await?;

            notify::send_info(
                store.as_ref(),
                match_id,
                referee_id,
                "Match Added",
                "The match has been added to your profile.",
            )
            .await?;
            for team_id in [team1_id, team2_id] {
                notify::send_info(
                    store.as_ref(),
                    match_id,
                    team_id,
                    "Referee Invite Accepted",
                    "The referee has accepted the invite.",
                )
                .await?;
            }
        }
        NotificationAction::View => {}
    }

    Ok(())
}

/// Mutate a match on behalf of a verified caller.
///
/// The payload shape must fit the match's current phase: a schedule
/// candidate while coaches negotiate, a typed referee operation once the
/// match is pending or underway.
pub async fn update_match(
    state: &SharedState,
    caller: &str,
    match_id: &str,
    request: UpdateMatchRequest,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(m) = store.find_match(match_id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified match does not exist".into(),
        ));
    };
    if m.kind != MatchKind::Classic {
        return Err(ServiceError::FailedPrecondition(
            "the specified match is not a classic match".into(),
        ));
    }
    let Some(team1) = store.find_team(&m.team1.id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the challenger team does not exist".into(),
        ));
    };
    let Some(team2) = store.find_team(&m.team2.id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the challenged team does not exist".into(),
        ));
    };

    let coach1 = is_coach(store.as_ref(), &m.team1.id, caller).await?;
    let coach2 = is_coach(store.as_ref(), &m.team2.id, caller).await?;

    if m.status.is_terminal() {
        return Err(ServiceError::FailedPrecondition(
            "the match is already finished or cancelled".into(),
        ));
    }
    if m.status == MatchStatus::RefereeWaiting {
        return Err(ServiceError::FailedPrecondition(
            "the match is waiting for the referee and can't be edited until they respond".into(),
        ));
    }
    if matches!(m.status, MatchStatus::Pending | MatchStatus::InProgress)
        && !(m.referee.agreed && m.referee.id.as_deref() == Some(caller))
    {
        return Err(ServiceError::FailedPrecondition(
            "only the agreed referee can edit a pending or in-progress match".into(),
        ));
    }
    if m.status == MatchStatus::CoachesEdit && !coach1 && !coach2 {
        return Err(ServiceError::FailedPrecondition(
            "only a coach of one of the teams can edit the match".into(),
        ));
    }

    match (m.status, request) {
        (MatchStatus::CoachesEdit, UpdateMatchRequest::Coach(edit)) => {
            coach_edit(store.as_ref(), m, &team1, &team2, coach1, edit).await
        }
        (MatchStatus::CoachesEdit, UpdateMatchRequest::Referee(_)) => {
            Err(ServiceError::InvalidArgument(
                "negotiation requires (start_in_ms, location, referee_id)".into(),
            ))
        }
        (
            MatchStatus::Pending | MatchStatus::InProgress,
            UpdateMatchRequest::Referee(edit),
        ) => referee_edit(store.as_ref(), m, &team1, &team2, edit).await,
        (MatchStatus::Pending | MatchStatus::InProgress, UpdateMatchRequest::Coach(_)) => {
            Err(ServiceError::InvalidArgument(
                "a typed referee operation is required in this status".into(),
            ))
        }
        (status, _) => Err(ServiceError::FailedPrecondition(format!(
            "the match cannot be edited in status {status:?}"
        ))),
    }
}

/// Handle a coach's schedule candidate while the match is in `coachs_edit`.
async fn coach_edit(
    store: &dyn RecordStore,
    mut m: MatchEntity,
    team1: &TeamEntity,
    team2: &TeamEntity,
    editor_is_team1: bool,
    edit: CoachPhaseUpdate,
) -> Result<(), ServiceError> {
    let Some(referee_user) = store.find_user(&edit.referee_id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified referee does not exist".into(),
        ));
    };
    if referee_user.account_type != AccountType::Referee {
        return Err(ServiceError::FailedPrecondition(
            "the specified user is not a referee".into(),
        ));
    }

    let now = SystemTime::now();
    let start_in = (edit.start_in_ms > 0)
        .then(|| SystemTime::UNIX_EPOCH + Duration::from_millis(edit.start_in_ms as u64))
        .filter(|candidate| *candidate > now)
        .ok_or_else(|| {
            ServiceError::FailedPrecondition("the match start date must be in the future".into())
        })?;

    validate_location_link(&edit.location).map_err(|_| {
        ServiceError::FailedPrecondition("the location must be a maps place link".into())
    })?;

    let match_id = m.id.clone();
    let (editor_team_name, other_team_id) = if editor_is_team1 {
        (team1.team_name.as_str(), m.team2.id.clone())
    } else {
        (team2.team_name.as_str(), m.team1.id.clone())
    };

    let same_proposal = m.referee.id.as_deref() == Some(edit.referee_id.as_str())
        && m.start_in == Some(start_in)
        && m.location.as_deref() == Some(edit.location.as_str());
    let other_agreed = if editor_is_team1 {
        m.team2.agreed
    } else {
        m.team1.agreed
    };

    if same_proposal && other_agreed {
        // Submitting the standing proposal verbatim is the agreement itself.
        notify::send(
            store,
            NotificationEntity::actionable(
                NotificationKind::RefereeInvite,
                match_id.clone(),
                edit.referee_id,
                "Referee Invite",
                format!(
                    "You have been invited to referee the match between '{}' and '{}' at {}.",
                    team1.team_name,
                    team2.team_name,
                    format_system_time(start_in)
                ),
            ),
        )
        .await?;

        if editor_is_team1 {
            m.team1.agreed = true;
        } else {
            m.team2.agreed = true;
        }
        m.status = compute_transition(m.status, MatchEvent::ScheduleAgreed)?;
        m.updated_at = now;
        store.save_match(m).await?;

        notify::send_info(
            store,
            match_id,
            other_team_id,
            "Match Details Updated",
            format!("The match details have been accepted by the {editor_team_name} coach."),
        )
        .await?;
        return Ok(());
    }

    // A fresh proposal (or a counter-proposal after the other side agreed to
    // something else) restarts negotiation from the editor's side.
    m.referee = RefereeSlot {
        id: Some(edit.referee_id),
        agreed: false,
    };
    m.start_in = Some(start_in);
    m.location = Some(edit.location);
    if editor_is_team1 {
        m.team1.agreed = true;
        m.team2.agreed = false;
    } else {
        m.team1.agreed = false;
        m.team2.agreed = true;
    }
    m.updated_at = now;
    store.save_match(m).await?;

    notify::send_info(
        store,
        match_id,
        other_team_id,
        "Match Details Updated",
        format!("The match details have been updated by the {editor_team_name} coach."),
    )
    .await?;

    Ok(())
}

/// Handle a typed operation from the agreed referee.
async fn referee_edit(
    store: &dyn RecordStore,
    mut m: MatchEntity,
    team1: &TeamEntity,
    team2: &TeamEntity,
    edit: RefereePhaseUpdate,
) -> Result<(), ServiceError> {
    if m.status == MatchStatus::Pending
        && !matches!(edit.op, RefereeOp::SetInProgress | RefereeOp::CancelMatch)
    {
        return Err(ServiceError::FailedPrecondition(
            "a pending match can only be started or cancelled".into(),
        ));
    }

    let now = SystemTime::now();
    match edit.op {
        RefereeOp::SetInProgress => {
            if m.status == MatchStatus::InProgress {
                return Err(ServiceError::FailedPrecondition(
                    "the match is already in progress".into(),
                ));
            }
            m.status = compute_transition(m.status, MatchEvent::KickOff)?;
            m.team1.score = Some(0);
            m.team1.agreed = true;
            m.team2.score = Some(0);
            m.team2.agreed = true;
            m.start_in = Some(now);
        }
        RefereeOp::EditResult => {
            let result = edit.result.ok_or_else(|| {
                ServiceError::InvalidArgument("the edit_result operation requires a result".into())
            })?;
            m.team1.score = Some(result.team1);
            m.team1.agreed = true;
            m.team2.score = Some(result.team2);
            m.team2.agreed = true;
            m.referee.agreed = true;
        }
        RefereeOp::CancelMatch => {
            if m.status == MatchStatus::InProgress {
                return Err(ServiceError::FailedPrecondition(
                    "an in-progress match can't be cancelled; it has to be ended".into(),
                ));
            }
            m.status = compute_transition(m.status, MatchEvent::Cancel)?;
        }
        RefereeOp::EndMatch => {
            // A score of 0 is a real score; only a missing score blocks the end.
            if m.team1.score.is_none() || m.team2.score.is_none() {
                return Err(ServiceError::FailedPrecondition(
                    "the match result must be recorded for both teams before ending".into(),
                ));
            }
            m.status = compute_transition(m.status, MatchEvent::End)?;
            m.ended_at = Some(now);
        }
    }

    m.updated_at = now;
    let match_id = m.id.clone();
    let (team1_slot, team2_slot) = (m.team1.clone(), m.team2.clone());
    store.save_match(m).await?;

    for team_id in [&team1_slot.id, &team2_slot.id] {
        notify::send_info(
            store,
            match_id.clone(),
            team_id.clone(),
            "Match Details Updated",
            "The match details have been updated by the referee.",
        )
        .await?;
    }

    if edit.op == RefereeOp::EndMatch {
        let sides = [
            (&team1_slot, team1.team_name.as_str()),
            (&team2_slot, team2.team_name.as_str()),
        ];
        announce_outcome(store, &match_id, sides).await?;
    }

    Ok(())
}

/// Emit the win/lose/draw notification pair for a finished match.
async fn announce_outcome(
    store: &dyn RecordStore,
    match_id: &str,
    sides: [(&TeamSlot, &str); 2],
) -> Result<(), ServiceError> {
    let [(slot1, name1), (slot2, name2)] = sides;
    let score1 = slot1.score.unwrap_or_default();
    let score2 = slot2.score.unwrap_or_default();

    let ((winner, winner_name), (loser, loser_name)) = match score1.cmp(&score2) {
        std::cmp::Ordering::Greater => ((slot1, name1), (slot2, name2)),
        std::cmp::Ordering::Less => ((slot2, name2), (slot1, name1)),
        std::cmp::Ordering::Equal => {
            let message =
                format!("The match between {name1} and {name2} has ended in a draw.");
            for slot in [slot1, slot2] {
                notify::send_info(store, match_id, &slot.id, "Match Finished", message.clone())
                    .await?;
            }
            return Ok(());
        }
    };

    notify::send_info(
        store,
        match_id,
        &winner.id,
        "Match Finished",
        format!("Congratulations! Your team {winner_name} has won the match."),
    )
    .await?;
    notify::send_info(
        store,
        match_id,
        &loser.id,
        "Match Finished",
        format!("Your team {loser_name} has lost the match."),
    )
    .await?;

    Ok(())
}

/// Cancel a match on behalf of one of its coaches.
///
/// Allowed from `coachs_edit`, `refree_waiting`, and `pending` only; an
/// in-progress match has to run to its end.
pub async fn cancel_match(
    state: &SharedState,
    caller: &str,
    match_id: &str,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(mut m) = store.find_match(match_id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified match does not exist".into(),
        ));
    };
    if m.kind != MatchKind::Classic {
        return Err(ServiceError::FailedPrecondition(
            "the specified match is not a classic match".into(),
        ));
    }
    let Some(team1) = store.find_team(&m.team1.id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the challenger team does not exist".into(),
        ));
    };
    let Some(team2) = store.find_team(&m.team2.id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the challenged team does not exist".into(),
        ));
    };

    let coach1 = is_coach(store.as_ref(), &m.team1.id, caller).await?;
    let coach2 = is_coach(store.as_ref(), &m.team2.id, caller).await?;
    if !coach1 && !coach2 {
        return Err(ServiceError::FailedPrecondition(
            "the caller is not a coach of either team".into(),
        ));
    }

    if m.status.is_terminal() {
        return Err(ServiceError::FailedPrecondition(
            "the match is already finished or cancelled".into(),
        ));
    }
    if m.status == MatchStatus::InProgress {
        return Err(ServiceError::FailedPrecondition(
            "an in-progress match can't be cancelled".into(),
        ));
    }

    let was_pending = m.status == MatchStatus::Pending;
    let referee_id = m.referee.id.clone();
    let (other_team_id, canceller_name) = if coach1 {
        (m.team2.id.clone(), team1.team_name.as_str())
    } else {
        (m.team1.id.clone(), team2.team_name.as_str())
    };

    m.status = compute_transition(m.status, MatchEvent::Cancel)?;
    m.updated_at = SystemTime::now();
    store.save_match(m).await?;

    notify::send_info(
        store.as_ref(),
        match_id,
        other_team_id,
        "Match Cancelled",
        format!("The match has been cancelled by the {canceller_name} coach."),
    )
    .await?;

    if was_pending {
        if let Some(referee_id) = referee_id {
            notify::send_info(
                store.as_ref(),
                match_id,
                referee_id,
                "Match Cancelled",
                format!("The match has been cancelled by the {canceller_name} coach."),
            )
            .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::record_store::memory::MemoryRecordStore;
    use crate::dto::match_update::MatchResultInput;
    use crate::services::testutil::{
        notifications_titled, seed_challenge_match, seed_user, state_with_memory,
    };

    const LOCATION: &str = "https://www.google.com/maps/place/City+Stadium/@36.75,3.04,17z/data=!3m1";
    const MATCH_ID: &str = "challenge-1";

    fn future_ms() -> i64 {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64;
        now + 3_600_000
    }

    fn coach_payload(start_in_ms: i64, location: &str, referee_id: &str) -> UpdateMatchRequest {
        UpdateMatchRequest::Coach(CoachPhaseUpdate {
            start_in_ms,
            location: location.to_owned(),
            referee_id: referee_id.to_owned(),
        })
    }

    fn referee_payload(op: RefereeOp, result: Option<(i64, i64)>) -> UpdateMatchRequest {
        UpdateMatchRequest::Referee(RefereePhaseUpdate {
            op,
            result: result.map(|(team1, team2)| MatchResultInput { team1, team2 }),
        })
    }

    async fn setup() -> (SharedState, MemoryRecordStore) {
        let (state, store) = state_with_memory();
        seed_challenge_match(&store, MATCH_ID).await;
        seed_user(&store, "ref-1", "whistler", AccountType::Referee).await;
        (state, store)
    }

    /// Drive the seeded match from negotiation to an agreed referee.
    async fn drive_to_pending(state: &SharedState, store: &MemoryRecordStore, start: i64) {
        update_match(state, "coach-1", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();
        update_match(state, "coach-2", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();
        referee_response(state, MATCH_ID, "ref-1", NotificationAction::Accept)
            .await
            .unwrap();
        store.clear_notifications();
    }

    async fn drive_to_in_progress(state: &SharedState, store: &MemoryRecordStore) {
        drive_to_pending(state, store, future_ms()).await;
        update_match(
            state,
            "ref-1",
            MATCH_ID,
            referee_payload(RefereeOp::SetInProgress, None),
        )
        .await
        .unwrap();
        store.clear_notifications();
    }

    #[tokio::test]
    async fn self_challenge_declines_without_creating_match() {
        let (state, store) = state_with_memory();
        create_from_challenge(&state, "n-1", "team-1", "team-1")
            .await
            .unwrap();

        assert!(store.find_match("n-1").await.unwrap().is_none());
        let declines = notifications_titled(&store, "Match Challenge Declined");
        assert_eq!(declines.len(), 1);
        assert_eq!(declines[0].to_id, "team-1");
        assert_eq!(store.notifications().len(), 1);
    }

    #[tokio::test]
    async fn challenge_replay_is_a_silent_noop() {
        let (state, store) = state_with_memory();
        seed_challenge_match(&store, "unused").await;

        create_from_challenge(&state, "n-1", "team-1", "team-2")
            .await
            .unwrap();
        let after_first = store.notifications().len();
        assert!(store.find_match("n-1").await.unwrap().is_some());

        create_from_challenge(&state, "n-1", "team-1", "team-2")
            .await
            .unwrap();
        assert_eq!(store.notifications().len(), after_first);
    }

    #[tokio::test]
    async fn challenge_creates_match_and_notifies_both_teams() {
        let (state, store) = state_with_memory();
        seed_challenge_match(&store, "unused").await;

        create_from_challenge(&state, "n-1", "team-1", "team-2")
            .await
            .unwrap();

        let m = store.find_match("n-1").await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::CoachesEdit);
        assert_eq!(m.kind, MatchKind::Classic);
        assert!(m.team1.score.is_none() && m.team2.score.is_none());
        assert!(!m.team1.agreed && !m.team2.agreed);
        assert!(m.referee.id.is_none());
        assert!(m.start_in.is_none() && m.location.is_none());

        assert_eq!(notifications_titled(&store, "Match Challenge Accepted").len(), 1);
        assert_eq!(notifications_titled(&store, "Match Created").len(), 1);
    }

    #[tokio::test]
    async fn first_proposal_marks_only_the_editor_agreed() {
        let (state, store) = setup().await;
        let start = future_ms();

        update_match(&state, "coach-1", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();

        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::CoachesEdit);
        assert!(m.team1.agreed);
        assert!(!m.team2.agreed);
        assert_eq!(m.referee.id.as_deref(), Some("ref-1"));
        assert!(!m.referee.agreed);
        assert_eq!(m.location.as_deref(), Some(LOCATION));

        let notices = notifications_titled(&store, "Match Details Updated");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].to_id, "team-2");
    }

    #[tokio::test]
    async fn identical_counter_proposal_converges_to_referee_waiting() {
        let (state, store) = setup().await;
        let start = future_ms();

        update_match(&state, "coach-1", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();
        store.clear_notifications();

        update_match(&state, "coach-2", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();

        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::RefereeWaiting);
        assert!(m.team1.agreed && m.team2.agreed);
        assert_eq!(m.referee.id.as_deref(), Some("ref-1"));
        assert!(!m.referee.agreed);

        let invites: Vec<_> = store
            .notifications()
            .into_iter()
            .map(|(_, n)| n)
            .filter(|n| n.kind == NotificationKind::RefereeInvite)
            .collect();
        assert_eq!(invites.len(), 1);
        assert_eq!(invites[0].to_id, "ref-1");
        assert_eq!(invites[0].from_id, MATCH_ID);

        let notices = notifications_titled(&store, "Match Details Updated");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].to_id, "team-1");
        assert_eq!(store.notifications().len(), 2);
    }

    #[tokio::test]
    async fn different_counter_proposal_resets_the_other_side() {
        let (state, store) = setup().await;
        seed_user(&store, "ref-2", "other_whistler", AccountType::Referee).await;
        let start = future_ms();

        update_match(&state, "coach-1", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();
        update_match(&state, "coach-2", MATCH_ID, coach_payload(start, LOCATION, "ref-2"))
            .await
            .unwrap();

        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::CoachesEdit);
        assert!(!m.team1.agreed);
        assert!(m.team2.agreed);
        assert_eq!(m.referee.id.as_deref(), Some("ref-2"));
    }

    #[tokio::test]
    async fn proposal_validation_rejects_bad_candidates() {
        let (state, store) = setup().await;
        let start = future_ms();

        // Unknown referee.
        let err = update_match(&state, "coach-1", MATCH_ID, coach_payload(start, LOCATION, "nobody"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));

        // Candidate referee with the wrong account type.
        seed_user(&store, "not-ref", "fieldplayer", AccountType::Player).await;
        let err = update_match(&state, "coach-1", MATCH_ID, coach_payload(start, LOCATION, "not-ref"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));

        // Start instant in the past.
        let err = update_match(&state, "coach-1", MATCH_ID, coach_payload(1, LOCATION, "ref-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));

        // Location that is not a maps place link.
        let err = update_match(
            &state,
            "coach-1",
            MATCH_ID,
            coach_payload(start, "https://example.com/field", "ref-1"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));

        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert!(!m.team1.agreed && !m.team2.agreed);
    }

    #[tokio::test]
    async fn non_coach_cannot_negotiate() {
        let (state, _store) = setup().await;
        let err = update_match(
            &state,
            "stranger",
            MATCH_ID,
            coach_payload(future_ms(), LOCATION, "ref-1"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn referee_waiting_match_is_frozen() {
        let (state, store) = setup().await;
        let start = future_ms();
        update_match(&state, "coach-1", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();
        update_match(&state, "coach-2", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();

        let err = update_match(&state, "coach-1", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));
        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::RefereeWaiting);
    }

    #[tokio::test]
    async fn referee_decline_resets_negotiation() {
        let (state, store) = setup().await;
        let start = future_ms();
        update_match(&state, "coach-1", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();
        update_match(&state, "coach-2", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();
        store.clear_notifications();

        referee_response(&state, MATCH_ID, "ref-1", NotificationAction::Decline)
            .await
            .unwrap();

        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::CoachesEdit);
        assert_eq!(m.referee, RefereeSlot { id: None, agreed: false });

        let notices = notifications_titled(&store, "Referee Invite Declined");
        assert_eq!(notices.len(), 2);
        let recipients: Vec<_> = notices.iter().map(|n| n.to_id.as_str()).collect();
        assert!(recipients.contains(&"team-1") && recipients.contains(&"team-2"));
    }

    #[tokio::test]
    async fn referee_accept_moves_to_pending() {
        let (state, store) = setup().await;
        let start = future_ms();
        update_match(&state, "coach-1", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();
        update_match(&state, "coach-2", MATCH_ID, coach_payload(start, LOCATION, "ref-1"))
            .await
            .unwrap();
        store.clear_notifications();

        referee_response(&state, MATCH_ID, "ref-1", NotificationAction::Accept)
            .await
            .unwrap();

        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Pending);
        assert!(m.referee.agreed);

        assert_eq!(notifications_titled(&store, "Match Added").len(), 1);
        assert_eq!(notifications_titled(&store, "Referee Invite Accepted").len(), 2);
    }

    #[tokio::test]
    async fn stale_referee_response_is_ignored() {
        let (state, store) = setup().await;
        // Still in coachs_edit: no invitation outstanding.
        referee_response(&state, MATCH_ID, "ref-1", NotificationAction::Accept)
            .await
            .unwrap();

        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::CoachesEdit);
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn set_in_progress_zeroes_scores() {
        let (state, store) = setup().await;
        drive_to_pending(&state, &store, future_ms()).await;

        update_match(
            &state,
            "ref-1",
            MATCH_ID,
            referee_payload(RefereeOp::SetInProgress, None),
        )
        .await
        .unwrap();

        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::InProgress);
        assert_eq!(m.team1.score, Some(0));
        assert_eq!(m.team2.score, Some(0));
        assert!(m.team1.agreed && m.team2.agreed);
        assert_eq!(notifications_titled(&store, "Match Details Updated").len(), 2);
    }

    #[tokio::test]
    async fn pending_match_rejects_result_edits() {
        let (state, store) = setup().await;
        drive_to_pending(&state, &store, future_ms()).await;

        let err = update_match(
            &state,
            "ref-1",
            MATCH_ID,
            referee_payload(RefereeOp::EditResult, Some((1, 0))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn only_the_agreed_referee_may_touch_a_pending_match() {
        let (state, store) = setup().await;
        drive_to_pending(&state, &store, future_ms()).await;

        let err = update_match(
            &state,
            "coach-1",
            MATCH_ID,
            referee_payload(RefereeOp::SetInProgress, None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn win_and_lose_notifications_follow_the_score() {
        let (state, store) = setup().await;
        drive_to_in_progress(&state, &store).await;

        update_match(
            &state,
            "ref-1",
            MATCH_ID,
            referee_payload(RefereeOp::EditResult, Some((3, 1))),
        )
        .await
        .unwrap();
        store.clear_notifications();

        update_match(&state, "ref-1", MATCH_ID, referee_payload(RefereeOp::EndMatch, None))
            .await
            .unwrap();

        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Finished);
        assert!(m.ended_at.is_some());

        let finished = notifications_titled(&store, "Match Finished");
        assert_eq!(finished.len(), 2);
        let to_team1 = finished.iter().find(|n| n.to_id == "team-1").unwrap();
        let to_team2 = finished.iter().find(|n| n.to_id == "team-2").unwrap();
        assert!(to_team1.message.contains("won"));
        assert!(to_team2.message.contains("lost"));
    }

    #[tokio::test]
    async fn equal_scores_notify_a_draw_both_ways() {
        let (state, store) = setup().await;
        drive_to_in_progress(&state, &store).await;

        update_match(
            &state,
            "ref-1",
            MATCH_ID,
            referee_payload(RefereeOp::EditResult, Some((2, 2))),
        )
        .await
        .unwrap();
        store.clear_notifications();

        update_match(&state, "ref-1", MATCH_ID, referee_payload(RefereeOp::EndMatch, None))
            .await
            .unwrap();

        let finished = notifications_titled(&store, "Match Finished");
        assert_eq!(finished.len(), 2);
        assert!(finished.iter().all(|n| n.message.contains("draw")));
    }

    #[tokio::test]
    async fn goalless_draw_still_announced() {
        // A 0 score is a legitimate score; ending right after kick-off is a 0-0 draw.
        let (state, store) = setup().await;
        drive_to_in_progress(&state, &store).await;

        update_match(&state, "ref-1", MATCH_ID, referee_payload(RefereeOp::EndMatch, None))
            .await
            .unwrap();

        let finished = notifications_titled(&store, "Match Finished");
        assert_eq!(finished.len(), 2);
        assert!(finished.iter().all(|n| n.message.contains("draw")));
    }

    #[tokio::test]
    async fn in_progress_match_cannot_be_cancelled() {
        let (state, store) = setup().await;
        drive_to_in_progress(&state, &store).await;

        let err = update_match(
            &state,
            "ref-1",
            MATCH_ID,
            referee_payload(RefereeOp::CancelMatch, None),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));

        let err = cancel_match(&state, "coach-1", MATCH_ID).await.unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));
        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::InProgress);
    }

    #[tokio::test]
    async fn terminal_match_rejects_every_mutation() {
        let (state, store) = setup().await;
        drive_to_in_progress(&state, &store).await;
        update_match(&state, "ref-1", MATCH_ID, referee_payload(RefereeOp::EndMatch, None))
            .await
            .unwrap();
        let frozen = store.find_match(MATCH_ID).await.unwrap().unwrap();
        store.clear_notifications();

        let err = update_match(
            &state,
            "coach-1",
            MATCH_ID,
            coach_payload(future_ms(), LOCATION, "ref-1"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));

        let err = cancel_match(&state, "coach-1", MATCH_ID).await.unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));

        assert_eq!(store.find_match(MATCH_ID).await.unwrap().unwrap(), frozen);
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn coach_cancellation_notifies_the_other_side() {
        let (state, store) = setup().await;

        cancel_match(&state, "coach-2", MATCH_ID).await.unwrap();

        let m = store.find_match(MATCH_ID).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Cancelled);
        let notices = notifications_titled(&store, "Match Cancelled");
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].to_id, "team-1");
        assert!(notices[0].message.contains("blue_sharks"));
    }

    #[tokio::test]
    async fn cancelling_a_pending_match_also_notifies_the_referee() {
        let (state, store) = setup().await;
        drive_to_pending(&state, &store, future_ms()).await;

        cancel_match(&state, "coach-1", MATCH_ID).await.unwrap();

        let notices = notifications_titled(&store, "Match Cancelled");
        assert_eq!(notices.len(), 2);
        let recipients: Vec<_> = notices.iter().map(|n| n.to_id.as_str()).collect();
        assert!(recipients.contains(&"team-2") && recipients.contains(&"ref-1"));
    }

    #[tokio::test]
    async fn cancellation_requires_a_coach() {
        let (state, _store) = setup().await;
        let err = cancel_match(&state, "stranger", MATCH_ID).await.unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));
    }
}
