use std::time::SystemTime;

use tracing::info;

use crate::{
    dao::models::{AccountType, MemberEntity, MemberRole},
    error::ServiceError,
    services::{JoinOrigin, notify},
    state::SharedState,
};

/// Add a user to a team roster after eligibility checks.
///
/// Dispatcher delegate for accepted `request_to_join_team` and
/// `invite_to_team` notifications. Missing records are silent no-ops
/// (trigger contract); business rejections emit the paired decline
/// notifications, one per audience.
pub async fn join_team(
    state: &SharedState,
    user_id: &str,
    team_id: &str,
    origin: JoinOrigin,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(user) = store.find_user(user_id).await? else {
        return Ok(());
    };
    let Some(team) = store.find_team(team_id).await? else {
        return Ok(());
    };

    if user.account_type != AccountType::Player {
        notify::send_info(
            store.as_ref(),
            team_id,
            user_id,
            origin.declined_title(),
            format!(
                "You can't join the team {} because your account type is not player.",
                team.team_name
            ),
        )
        .await?;
        notify::send_info(
            store.as_ref(),
            user_id,
            team_id,
            origin.declined_title(),
            format!(
                "{} can't join the team because their account type is not player.",
                user.username
            ),
        )
        .await?;
        return Ok(());
    }

    if !store.memberships_for_user(user_id).await?.is_empty() {
        notify::send_info(
            store.as_ref(),
            team_id,
            user_id,
            origin.declined_title(),
            format!(
                "You can't join the team {} because you are already in a team.",
                team.team_name
            ),
        )
        .await?;
        notify::send_info(
            store.as_ref(),
            user_id,
            team_id,
            origin.declined_title(),
            format!(
                "{} can't join the team because they are already in a team.",
                user.username
            ),
        )
        .await?;
        return Ok(());
    }

    if team.black_list.iter().any(|blocked| blocked == user_id) {
        notify::send_info(
            store.as_ref(),
            team_id,
            user_id,
            origin.declined_title(),
            format!(
                "You can't join the team {} because you are on the team blacklist.",
                team.team_name
            ),
        )
        .await?;
        notify::send_info(
            store.as_ref(),
            user_id,
            team_id,
            origin.declined_title(),
            format!(
                "{} can't join the team because they are on the team blacklist.",
                user.username
            ),
        )
        .await?;
        return Ok(());
    }

    store
        .save_member(MemberEntity {
            uid: user_id.to_owned(),
            team_id: team_id.to_owned(),
            role: MemberRole::Member,
            joined_at: SystemTime::now(),
        })
        .await?;

    Ok(())
}

/// React to a roster entry appearing: announce the newcomer to every member.
///
/// Skips silently when the user record is missing or the roster role does not
/// match the account type (`member` requires `player`, `coach` requires
/// `coach`).
pub async fn member_added(
    state: &SharedState,
    team_id: &str,
    uid: &str,
    member: &MemberEntity,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(user) = store.find_user(uid).await? else {
        info!(uid, "member added for unknown user; skipping fan-out");
        return Ok(());
    };

    let role_matches = matches!(
        (member.role, user.account_type),
        (MemberRole::Member, AccountType::Player) | (MemberRole::Coach, AccountType::Coach)
    );
    if !role_matches {
        info!(uid, role = ?member.role, account_type = ?user.account_type,
            "member role does not match account type; skipping fan-out");
        return Ok(());
    }

    let role_word = match member.role {
        MemberRole::Coach => "coach",
        MemberRole::Member => "member",
    };
    for roster_entry in store.list_members(team_id).await? {
        notify::send_info(
            store.as_ref(),
            team_id,
            &roster_entry.uid,
            "New Team Member Joined",
            format!("{} has joined the team as a new {role_word}.", user.username),
        )
        .await?;
    }

    Ok(())
}

/// React to a roster entry disappearing: announce it to every remaining member.
pub async fn member_removed(
    state: &SharedState,
    team_id: &str,
    uid: &str,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let username = store
        .find_user(uid)
        .await?
        .map(|user| user.username)
        .unwrap_or_else(|| "A member".to_owned());

    for roster_entry in store.list_members(team_id).await? {
        notify::send_info(
            store.as_ref(),
            team_id,
            &roster_entry.uid,
            "Team Member Removed",
            format!("{username} has been removed from the team."),
        )
        .await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::record_store::RecordStore;
    use crate::services::testutil::{
        notifications_titled, seed_member, seed_user, state_with_memory, team,
    };

    #[tokio::test]
    async fn blacklisted_user_never_becomes_member() {
        let (state, store) = state_with_memory();
        seed_user(&store, "u1", "player_one", AccountType::Player).await;
        let mut blocked_team = team("red_dragons", "coach-1");
        blocked_team.black_list.push("u1".to_owned());
        store.save_team("team-1", blocked_team).await.unwrap();

        join_team(&state, "u1", "team-1", JoinOrigin::Request)
            .await
            .unwrap();

        assert!(store.find_member("team-1", "u1").await.unwrap().is_none());
        let declines = notifications_titled(&store, "Request Declined");
        assert_eq!(declines.len(), 2);
        assert_eq!(declines[0].to_id, "u1");
        assert!(declines[0].message.contains("blacklist"));
        assert_eq!(declines[1].to_id, "team-1");
        assert!(declines[1].message.contains("player_one"));
    }

    #[tokio::test]
    async fn wrong_account_type_declines_both_ways() {
        let (state, store) = state_with_memory();
        seed_user(&store, "u1", "not_a_player", AccountType::Coach).await;
        store
            .save_team("team-1", team("red_dragons", "coach-1"))
            .await
            .unwrap();

        join_team(&state, "u1", "team-1", JoinOrigin::Invite)
            .await
            .unwrap();

        assert!(store.find_member("team-1", "u1").await.unwrap().is_none());
        let declines = notifications_titled(&store, "Invite Declined");
        assert_eq!(declines.len(), 2);
        assert!(declines[0].message.contains("account type is not player"));
    }

    #[tokio::test]
    async fn existing_membership_anywhere_blocks_join() {
        let (state, store) = state_with_memory();
        seed_user(&store, "u1", "player_one", AccountType::Player).await;
        store
            .save_team("team-1", team("red_dragons", "coach-1"))
            .await
            .unwrap();
        seed_member(&store, "team-other", "u1", MemberRole::Member).await;

        join_team(&state, "u1", "team-1", JoinOrigin::Request)
            .await
            .unwrap();

        assert!(store.find_member("team-1", "u1").await.unwrap().is_none());
        assert_eq!(notifications_titled(&store, "Request Declined").len(), 2);
    }

    #[tokio::test]
    async fn eligible_player_joins_silently() {
        let (state, store) = state_with_memory();
        seed_user(&store, "u1", "player_one", AccountType::Player).await;
        store
            .save_team("team-1", team("red_dragons", "coach-1"))
            .await
            .unwrap();

        join_team(&state, "u1", "team-1", JoinOrigin::Request)
            .await
            .unwrap();

        let member = store.find_member("team-1", "u1").await.unwrap().unwrap();
        assert_eq!(member.role, MemberRole::Member);
        assert!(store.notifications().is_empty());
    }

    #[tokio::test]
    async fn roster_addition_fans_out_to_all_members() {
        let (state, store) = state_with_memory();
        seed_user(&store, "u1", "player_one", AccountType::Player).await;
        seed_member(&store, "team-1", "coach-1", MemberRole::Coach).await;
        seed_member(&store, "team-1", "u1", MemberRole::Member).await;

        let member = store.find_member("team-1", "u1").await.unwrap().unwrap();
        member_added(&state, "team-1", "u1", &member).await.unwrap();

        let joined = notifications_titled(&store, "New Team Member Joined");
        assert_eq!(joined.len(), 2);
        assert!(joined.iter().all(|n| n.from_id == "team-1"));
    }

    #[tokio::test]
    async fn roster_addition_with_role_mismatch_is_silent() {
        let (state, store) = state_with_memory();
        // A coach-account user landing in the roster as plain member.
        seed_user(&store, "u1", "coach_account", AccountType::Coach).await;
        seed_member(&store, "team-1", "u1", MemberRole::Member).await;

        let member = store.find_member("team-1", "u1").await.unwrap().unwrap();
        member_added(&state, "team-1", "u1", &member).await.unwrap();

        assert!(store.notifications().is_empty());
    }
}
