use std::time::SystemTime;

use tracing::info;

use crate::{
    dao::models::{AccountType, MemberRole, TournamentStatus},
    error::ServiceError,
    services::{JoinOrigin, notify},
    state::SharedState,
};

/// Add a team to a tournament's participants after eligibility checks.
///
/// Dispatcher delegate for accepted `request_to_join_tournament` and
/// `invite_to_tournament` notifications. Missing records and duplicate
/// participation are silent no-ops; roster-size and capacity rejections emit
/// the paired decline notifications.
pub async fn join_tournament(
    state: &SharedState,
    team_id: &str,
    tournament_id: &str,
    origin: JoinOrigin,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(mut tournament) = store.find_tournament(tournament_id).await? else {
        return Ok(());
    };
    if tournament.participants.iter().any(|id| id == team_id) {
        return Ok(());
    }
    let Some(team) = store.find_team(team_id).await? else {
        return Ok(());
    };

    let roster_size = store.list_members(team_id).await?.len();
    if roster_size < tournament.min_members_in_team as usize {
        notify::send_info(
            store.as_ref(),
            tournament_id,
            team_id,
            origin.declined_title(),
            format!(
                "You can't join the tournament {} because your team has fewer members than required.",
                tournament.name
            ),
        )
        .await?;
        notify::send_info(
            store.as_ref(),
            team_id,
            tournament_id,
            origin.declined_title(),
            format!(
                "The team {} can't join the tournament {} because it has fewer members than required.",
                team.team_name, tournament.name
            ),
        )
        .await?;
        return Ok(());
    }

    if tournament.participants.len() >= tournament.max_participants as usize {
        notify::send_info(
            store.as_ref(),
            tournament_id,
            team_id,
            origin.declined_title(),
            format!(
                "Your team can't join the tournament {} because the tournament is full.",
                tournament.name
            ),
        )
        .await?;
        notify::send_info(
            store.as_ref(),
            team_id,
            tournament_id,
            origin.declined_title(),
            format!(
                "The team {} can't join the tournament {} because the tournament is full.",
                team.team_name, tournament.name
            ),
        )
        .await?;
        return Ok(());
    }

    tournament.participants.push(team_id.to_owned());
    tournament.updated_at = SystemTime::now();
    let tournament_name = tournament.name.clone();
    store.save_tournament(tournament_id, tournament).await?;

    notify::send_info(
        store.as_ref(),
        tournament_id,
        team_id,
        origin.accepted_title(),
        format!("Your team has been added to the tournament {tournament_name}."),
    )
    .await?;
    notify::send_info(
        store.as_ref(),
        team_id,
        tournament_id,
        "Team Added",
        format!(
            "The team {} has been added to the tournament {tournament_name}.",
            team.team_name
        ),
    )
    .await?;

    Ok(())
}

/// List a referee on a tournament after an accepted invitation.
///
/// Dispatcher delegate. Silent no-ops when the user is missing, is not a
/// referee, the tournament is missing, or the referee is already listed.
pub async fn add_referee(
    state: &SharedState,
    tournament_id: &str,
    referee_id: &str,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(user) = store.find_user(referee_id).await? else {
        return Ok(());
    };
    if user.account_type != AccountType::Referee {
        return Ok(());
    }
    let Some(mut tournament) = store.find_tournament(tournament_id).await? else {
        info!(tournament_id, "referee accepted an invite to a missing tournament");
        return Ok(());
    };
    if tournament.referee_ids.iter().any(|id| id == referee_id) {
        info!(tournament_id, referee_id, "referee already listed on the tournament");
        return Ok(());
    }

    tournament.referee_ids.push(referee_id.to_owned());
    tournament.updated_at = SystemTime::now();
    let tournament_name = tournament.name.clone();
    store.save_tournament(tournament_id, tournament).await?;

    notify::send_info(
        store.as_ref(),
        tournament_id,
        referee_id,
        "Tournament Added",
        format!("The tournament {tournament_name} has been added to your profile."),
    )
    .await?;
    notify::send_info(
        store.as_ref(),
        referee_id,
        tournament_id,
        "Referee Invite Accepted",
        "The referee has accepted the invite.",
    )
    .await?;

    Ok(())
}

/// Withdraw a team from a tournament, on behalf of the team's coach.
pub async fn leave_for_team(
    state: &SharedState,
    caller: &str,
    tournament_id: &str,
    team_id: &str,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(user) = store.find_user(caller).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified user does not exist".into(),
        ));
    };
    if user.account_type != AccountType::Coach {
        return Err(ServiceError::FailedPrecondition(
            "the specified user is not a coach".into(),
        ));
    }
    let Some(team) = store.find_team(team_id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified team does not exist".into(),
        ));
    };
    let is_team_coach = store
        .find_member(team_id, caller)
        .await?
        .is_some_and(|member| member.role == MemberRole::Coach);
    if !is_team_coach {
        return Err(ServiceError::FailedPrecondition(
            "the caller is not the coach of the team".into(),
        ));
    }
    let Some(mut tournament) = store.find_tournament(tournament_id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified tournament does not exist".into(),
        ));
    };
    if !tournament.participants.iter().any(|id| id == team_id) {
        return Err(ServiceError::FailedPrecondition(
            "the team is not in the tournament".into(),
        ));
    }
    if tournament.status != TournamentStatus::Pending {
        return Err(ServiceError::FailedPrecondition(
            "the tournament has started; teams can no longer leave it".into(),
        ));
    }

    tournament.participants.retain(|id| id != team_id);
    tournament.updated_at = SystemTime::now();
    let tournament_name = tournament.name.clone();
    store.save_tournament(tournament_id, tournament).await?;

    let message = format!(
        "The team {} has left the tournament {tournament_name}.",
        team.team_name
    );
    notify::send_info(store.as_ref(), team_id, tournament_id, "Team Left", message.clone())
        .await?;
    notify::send_info(store.as_ref(), tournament_id, team_id, "Tournament Left", message)
        .await?;

    Ok(())
}

/// Withdraw the calling referee from a tournament's listing.
pub async fn leave_for_referee(
    state: &SharedState,
    caller: &str,
    tournament_id: &str,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(user) = store.find_user(caller).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified user does not exist".into(),
        ));
    };
    if user.account_type != AccountType::Referee {
        return Err(ServiceError::FailedPrecondition(
            "the specified user is not a referee".into(),
        ));
    }
    let Some(mut tournament) = store.find_tournament(tournament_id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified tournament does not exist".into(),
        ));
    };
    if !tournament.referee_ids.iter().any(|id| id == caller) {
        return Err(ServiceError::FailedPrecondition(
            "the referee is not in the tournament".into(),
        ));
    }
    if tournament.status != TournamentStatus::Pending {
        return Err(ServiceError::FailedPrecondition(
            "the tournament has started; referees can no longer leave it".into(),
        ));
    }

    tournament.referee_ids.retain(|id| id != caller);
    tournament.updated_at = SystemTime::now();
    let tournament_name = tournament.name.clone();
    store.save_tournament(tournament_id, tournament).await?;

    let message = format!(
        "The referee {} has left the tournament {tournament_name}.",
        user.username
    );
    notify::send_info(store.as_ref(), caller, tournament_id, "Referee Left", message.clone())
        .await?;
    notify::send_info(store.as_ref(), tournament_id, caller, "Tournament Left", message)
        .await?;

    Ok(())
}

/// Delete a pending tournament, on behalf of its manager, and notify
/// everyone involved.
pub async fn remove_tournament(
    state: &SharedState,
    caller: &str,
    tournament_id: &str,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(user) = store.find_user(caller).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified user does not exist".into(),
        ));
    };
    if user.account_type != AccountType::TournamentManager {
        return Err(ServiceError::FailedPrecondition(
            "the specified user is not a tournament manager".into(),
        ));
    }
    let Some(tournament) = store.find_tournament(tournament_id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified tournament does not exist".into(),
        ));
    };
    if tournament.manager_id != caller {
        return Err(ServiceError::FailedPrecondition(
            "the caller is not the manager of the tournament".into(),
        ));
    }
    if tournament.status != TournamentStatus::Pending {
        return Err(ServiceError::FailedPrecondition(
            "only a pending tournament can be removed".into(),
        ));
    }

    store.delete_tournament(tournament_id).await?;

    notify::send_info(
        store.as_ref(),
        tournament_id,
        caller,
        "Tournament Removed",
        format!("The tournament {} has been removed.", tournament.name),
    )
    .await?;
    for referee_id in &tournament.referee_ids {
        notify::send_info(
            store.as_ref(),
            tournament_id,
            referee_id.clone(),
            "Tournament Cancelled",
            format!("The tournament {} has been cancelled.", tournament.name),
        )
        .await?;
    }
    for team_id in &tournament.participants {
        notify::send_info(
            store.as_ref(),
            tournament_id,
            team_id.clone(),
            "Tournament Cancelled",
            format!("The tournament {} has been cancelled.", tournament.name),
        )
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::TournamentEntity;
    use crate::dao::record_store::RecordStore;
    use crate::services::testutil::{
        notifications_titled, seed_coached_team, seed_member, seed_user, state_with_memory,
    };
    use crate::dao::models::MemberRole;

    fn tournament(name: &str, manager_id: &str, min: u32, max: u32) -> TournamentEntity {
        TournamentEntity {
            name: name.to_owned(),
            logo: "logo.png".to_owned(),
            description: "cup".to_owned(),
            start_date: SystemTime::now(),
            end_date: None,
            created_at: SystemTime::now(),
            updated_at: SystemTime::now(),
            created_by: manager_id.to_owned(),
            manager_id: manager_id.to_owned(),
            referee_ids: Vec::new(),
            location: "stadium".to_owned(),
            participants: Vec::new(),
            status: TournamentStatus::Pending,
            min_members_in_team: min,
            max_participants: max,
        }
    }

    #[tokio::test]
    async fn full_tournament_rejects_with_paired_notifications() {
        let (state, store) = state_with_memory();
        seed_coached_team(&store, "team-1", "red_dragons", "coach-1").await;
        let mut cup = tournament("summer_cup", "mgr-1", 1, 1);
        cup.participants.push("team-other".to_owned());
        store.save_tournament("cup-1", cup).await.unwrap();
        store.clear_notifications();

        join_tournament(&state, "team-1", "cup-1", JoinOrigin::Request)
            .await
            .unwrap();

        let cup = store.find_tournament("cup-1").await.unwrap().unwrap();
        assert_eq!(cup.participants, vec!["team-other".to_owned()]);

        let declines = notifications_titled(&store, "Request Declined");
        assert_eq!(declines.len(), 2);
        assert_eq!(declines[0].to_id, "team-1");
        assert!(declines[0].message.contains("full"));
        assert_eq!(declines[1].to_id, "cup-1");
        assert!(declines[1].message.contains("red_dragons"));
    }

    #[tokio::test]
    async fn undersized_roster_rejects_with_paired_notifications() {
        let (state, store) = state_with_memory();
        seed_coached_team(&store, "team-1", "red_dragons", "coach-1").await;
        store
            .save_tournament("cup-1", tournament("summer_cup", "mgr-1", 5, 8))
            .await
            .unwrap();
        store.clear_notifications();

        join_tournament(&state, "team-1", "cup-1", JoinOrigin::Invite)
            .await
            .unwrap();

        let cup = store.find_tournament("cup-1").await.unwrap().unwrap();
        assert!(cup.participants.is_empty());
        assert_eq!(notifications_titled(&store, "Invite Declined").len(), 2);
    }

    #[tokio::test]
    async fn eligible_team_joins_and_both_sides_are_told() {
        let (state, store) = state_with_memory();
        seed_coached_team(&store, "team-1", "red_dragons", "coach-1").await;
        store
            .save_tournament("cup-1", tournament("summer_cup", "mgr-1", 1, 8))
            .await
            .unwrap();
        store.clear_notifications();

        join_tournament(&state, "team-1", "cup-1", JoinOrigin::Request)
            .await
            .unwrap();

        let cup = store.find_tournament("cup-1").await.unwrap().unwrap();
        assert_eq!(cup.participants, vec!["team-1".to_owned()]);
        assert_eq!(notifications_titled(&store, "Request Accepted").len(), 1);
        assert_eq!(notifications_titled(&store, "Team Added").len(), 1);
    }

    #[tokio::test]
    async fn duplicate_participation_is_silent() {
        let (state, store) = state_with_memory();
        seed_coached_team(&store, "team-1", "red_dragons", "coach-1").await;
        let mut cup = tournament("summer_cup", "mgr-1", 1, 8);
        cup.participants.push("team-1".to_owned());
        store.save_tournament("cup-1", cup).await.unwrap();
        store.clear_notifications();

        join_tournament(&state, "team-1", "cup-1", JoinOrigin::Request)
            .await
            .unwrap();

        let cup = store.find_tournament("cup-1").await.unwrap().unwrap();
        assert_eq!(cup.participants.len(), 1);
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn accepted_referee_is_listed_once() {
        let (state, store) = state_with_memory();
        seed_user(&store, "ref-1", "whistler", AccountType::Referee).await;
        store
            .save_tournament("cup-1", tournament("summer_cup", "mgr-1", 1, 8))
            .await
            .unwrap();

        add_referee(&state, "cup-1", "ref-1").await.unwrap();
        add_referee(&state, "cup-1", "ref-1").await.unwrap();

        let cup = store.find_tournament("cup-1").await.unwrap().unwrap();
        assert_eq!(cup.referee_ids, vec!["ref-1".to_owned()]);
        assert_eq!(notifications_titled(&store, "Tournament Added").len(), 1);
        assert_eq!(notifications_titled(&store, "Referee Invite Accepted").len(), 1);
    }

    #[tokio::test]
    async fn leaving_a_started_tournament_fails() {
        let (state, store) = state_with_memory();
        seed_coached_team(&store, "team-1", "red_dragons", "coach-1").await;
        let mut cup = tournament("summer_cup", "mgr-1", 1, 8);
        cup.participants.push("team-1".to_owned());
        cup.status = TournamentStatus::InProgress;
        store.save_tournament("cup-1", cup).await.unwrap();

        let err = leave_for_team(&state, "coach-1", "cup-1", "team-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));
        let cup = store.find_tournament("cup-1").await.unwrap().unwrap();
        assert_eq!(cup.participants.len(), 1);
    }

    #[tokio::test]
    async fn team_leaves_a_pending_tournament() {
        let (state, store) = state_with_memory();
        seed_coached_team(&store, "team-1", "red_dragons", "coach-1").await;
        let mut cup = tournament("summer_cup", "mgr-1", 1, 8);
        cup.participants.push("team-1".to_owned());
        store.save_tournament("cup-1", cup).await.unwrap();
        store.clear_notifications();

        leave_for_team(&state, "coach-1", "cup-1", "team-1")
            .await
            .unwrap();

        let cup = store.find_tournament("cup-1").await.unwrap().unwrap();
        assert!(cup.participants.is_empty());
        assert_eq!(notifications_titled(&store, "Team Left").len(), 1);
        assert_eq!(notifications_titled(&store, "Tournament Left").len(), 1);
    }

    #[tokio::test]
    async fn referee_leaves_their_listing() {
        let (state, store) = state_with_memory();
        seed_user(&store, "ref-1", "whistler", AccountType::Referee).await;
        let mut cup = tournament("summer_cup", "mgr-1", 1, 8);
        cup.referee_ids.push("ref-1".to_owned());
        store.save_tournament("cup-1", cup).await.unwrap();

        leave_for_referee(&state, "ref-1", "cup-1").await.unwrap();

        let cup = store.find_tournament("cup-1").await.unwrap().unwrap();
        assert!(cup.referee_ids.is_empty());
        assert_eq!(notifications_titled(&store, "Referee Left").len(), 1);
    }

    #[tokio::test]
    async fn removal_notifies_manager_referees_and_teams() {
        let (state, store) = state_with_memory();
        seed_user(&store, "mgr-1", "organizer", AccountType::TournamentManager).await;
        let mut cup = tournament("summer_cup", "mgr-1", 1, 8);
        cup.referee_ids.push("ref-1".to_owned());
        cup.participants.extend(["team-1".to_owned(), "team-2".to_owned()]);
        store.save_tournament("cup-1", cup).await.unwrap();

        remove_tournament(&state, "mgr-1", "cup-1").await.unwrap();

        assert!(store.find_tournament("cup-1").await.unwrap().is_none());
        assert_eq!(notifications_titled(&store, "Tournament Removed").len(), 1);
        assert_eq!(notifications_titled(&store, "Tournament Cancelled").len(), 3);
    }

    #[tokio::test]
    async fn only_the_manager_can_remove() {
        let (state, store) = state_with_memory();
        seed_user(&store, "mgr-1", "organizer", AccountType::TournamentManager).await;
        seed_user(&store, "mgr-2", "impostor", AccountType::TournamentManager).await;
        store
            .save_tournament("cup-1", tournament("summer_cup", "mgr-1", 1, 8))
            .await
            .unwrap();

        let err = remove_tournament(&state, "mgr-2", "cup-1").await.unwrap_err();
        assert!(matches!(err, ServiceError::FailedPrecondition(_)));
        assert!(store.find_tournament("cup-1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn seed_member_helper_counts_toward_roster_floor() {
        let (state, store) = state_with_memory();
        seed_coached_team(&store, "team-1", "red_dragons", "coach-1").await;
        seed_user(&store, "u1", "player_one", AccountType::Player).await;
        seed_member(&store, "team-1", "u1", MemberRole::Member).await;
        store
            .save_tournament("cup-1", tournament("summer_cup", "mgr-1", 2, 8))
            .await
            .unwrap();
        store.clear_notifications();

        join_tournament(&state, "team-1", "cup-1", JoinOrigin::Request)
            .await
            .unwrap();

        let cup = store.find_tournament("cup-1").await.unwrap().unwrap();
        assert_eq!(cup.participants, vec!["team-1".to_owned()]);
    }
}
