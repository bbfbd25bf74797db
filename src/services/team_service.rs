use std::time::SystemTime;

use crate::{
    dao::models::{AccountType, MatchStatus, MemberEntity, MemberRole, TeamEntity},
    dto::{
        team::{CreateTeamRequest, UpdateTeamRequest},
        validation::validate_handle,
    },
    error::ServiceError,
    services::notify,
    state::SharedState,
};

/// Create a team owned by the calling coach, who becomes its first member.
pub async fn create_team(
    state: &SharedState,
    caller: &str,
    request: CreateTeamRequest,
) -> Result<String, ServiceError> {
    validate_handle(&request.team_name)
        .map_err(|_| ServiceError::InvalidArgument("invalid team name".into()))?;

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
    if !store.memberships_for_user(caller).await?.is_empty() {
        return Err(ServiceError::FailedPrecondition(
            "the coach is already a member of a team".into(),
        ));
    }
    if store.find_team_by_name(&request.team_name).await?.is_some() {
        return Err(ServiceError::AlreadyExists("team name is already taken".into()));
    }

    let now = SystemTime::now();
    let team_id = store
        .insert_team(TeamEntity {
            team_name: request.team_name,
            team_logo: request.team_logo,
            description: request.team_description,
            black_list: Vec::new(),
            created_by: caller.to_owned(),
            created_at: now,
            updated_at: now,
        })
        .await?;

    store
        .save_member(MemberEntity {
            uid: caller.to_owned(),
            team_id: team_id.clone(),
            role: MemberRole::Coach,
            joined_at: now,
        })
        .await?;

    Ok(team_id)
}

/// Update a team's profile fields, on behalf of its coach.
pub async fn update_team(
    state: &SharedState,
    caller: &str,
    team_id: &str,
    request: UpdateTeamRequest,
) -> Result<(), ServiceError> {
    if request.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "at least one field to update is required".into(),
        ));
    }
    if let Some(ref team_name) = request.team_name {
        validate_handle(team_name)
            .map_err(|_| ServiceError::InvalidArgument("invalid team name".into()))?;
    }

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
    let Some(mut team) = store.find_team(team_id).await? else {
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

    if let Some(ref team_name) = request.team_name {
        if let Some((existing_id, _)) = store.find_team_by_name(team_name).await? {
            if existing_id != team_id {
                return Err(ServiceError::AlreadyExists("team name is already taken".into()));
            }
        }
    }

    if let Some(team_name) = request.team_name {
        team.team_name = team_name;
    }
    if let Some(team_logo) = request.team_logo {
        team.team_logo = team_logo;
    }
    if let Some(description) = request.team_description {
        team.description = description;
    }
    team.updated_at = SystemTime::now();
    store.save_team(team_id, team).await?;

    Ok(())
}

/// Swap the coach role to another roster member.
///
/// Four sequential single-document writes, in a fixed order: demote the old
/// coach's roster entry, promote the new one, then flip the two account
/// types. A crash mid-sequence leaves a partially applied state; the order
/// guarantees the team never ends up with two coaches.
pub async fn change_coach(
    state: &SharedState,
    caller: &str,
    team_id: &str,
    member_id: &str,
) -> Result<(), ServiceError> {
    if caller == member_id {
        return Err(ServiceError::FailedPrecondition(
            "the coach and the member must be different users".into(),
        ));
    }

    let store = state.require_record_store().await?;

    let Some(mut coach_member) = store.find_member(team_id, caller).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified coach does not exist or is not a coach".into(),
        ));
    };
    if coach_member.role != MemberRole::Coach {
        return Err(ServiceError::FailedPrecondition(
            "the specified coach does not exist or is not a coach".into(),
        ));
    }
    let Some(mut promoted_member) = store.find_member(team_id, member_id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified member does not exist".into(),
        ));
    };
    let Some(mut promoted_user) = store.find_user(member_id).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified member user does not exist".into(),
        ));
    };
    let Some(mut coach_user) = store.find_user(caller).await? else {
        return Err(ServiceError::FailedPrecondition(
            "the specified coach user does not exist".into(),
        ));
    };

    // Demotion strictly before promotion.
    coach_member.role = MemberRole::Member;
    store.save_member(coach_member).await?;
    promoted_member.role = MemberRole::Coach;
    store.save_member(promoted_member).await?;

    let coach_username = coach_user.username.clone();
    let promoted_username = promoted_user.username.clone();
    coach_user.account_type = AccountType::Player;
    store.save_user(caller, coach_user).await?;
    promoted_user.account_type = AccountType::Coach;
    store.save_user(member_id, promoted_user).await?;

    notify::send_info(
        store.as_ref(),
        team_id,
        caller,
        "Role Changed",
        "Your role has been changed to member.",
    )
    .await?;
    notify::send_info(
        store.as_ref(),
        team_id,
        member_id,
        "Role Changed",
        "Your role has been changed to coach.",
    )
    .await?;

    for roster_entry in store.list_members(team_id).await? {
        notify::send_info(
            store.as_ref(),
            team_id,
            &roster_entry.uid,
            "Role Changed",
            format!(
                "The roles of {coach_username} and {promoted_username} have been swapped; the new coach is {promoted_username}."
            ),
        )
        .await?;
    }

    Ok(())
}

/// Disband an empty team: the coach leaves and the roster entry is removed.
///
/// Blocked while anyone else is on the roster or the team has a match that
/// is neither finished nor cancelled. The team record itself is retained.
pub async fn leave_team_for_coach(
    state: &SharedState,
    caller: &str,
    team_id: &str,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let coach_ok = store
        .find_member(team_id, caller)
        .await?
        .is_some_and(|member| member.role == MemberRole::Coach);
    if !coach_ok {
        return Err(ServiceError::FailedPrecondition(
            "the specified coach does not exist or is not a coach".into(),
        ));
    }

    if store.list_members(team_id).await?.len() > 1 {
        return Err(ServiceError::FailedPrecondition("the team is not empty".into()));
    }

    let open_matches = store
        .matches_for_team_excluding(
            team_id,
            vec![MatchStatus::Finished, MatchStatus::Cancelled],
        )
        .await?;
    if !open_matches.is_empty() {
        return Err(ServiceError::FailedPrecondition(
            "the team still has matches that are neither finished nor cancelled".into(),
        ));
    }

    store.delete_member(team_id, caller).await?;

    notify::send_info(
        store.as_ref(),
        team_id,
        caller,
        "Team Deleted",
        "The team has been deleted.",
    )
    .await?;

    Ok(())
}
