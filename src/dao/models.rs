use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Account type attached to every user record; drives every role check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AccountType {
    /// Freshly registered account with no role yet.
    #[serde(rename = "user")]
    User,
    /// May create and run exactly one team.
    #[serde(rename = "coach")]
    Coach,
    /// May join a team roster as a regular member.
    #[serde(rename = "player")]
    Player,
    /// May officiate classic matches and be listed on tournaments.
    #[serde(rename = "refree")]
    Referee,
    /// May own and administer tournaments.
    #[serde(rename = "tournament_manager")]
    TournamentManager,
}

/// User profile record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserEntity {
    /// Globally unique handle, normalized lowercase.
    pub username: String,
    /// Current account type.
    pub account_type: AccountType,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub birthday: Option<SystemTime>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub phone_numbers: Option<Vec<String>>,
    /// Set once at account creation.
    pub join_date: Option<SystemTime>,
}

/// Declared gender on a user profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    #[serde(rename = "male")]
    Male,
    #[serde(rename = "female")]
    Female,
}

/// Team record. The member roster lives in a per-team sub-collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamEntity {
    /// Unique handle, normalized lowercase.
    pub team_name: String,
    pub team_logo: String,
    pub description: String,
    /// User ids barred from joining this team regardless of other eligibility.
    pub black_list: Vec<String>,
    /// Uid of the founding coach.
    pub created_by: String,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

/// Role of a roster member. A team has at most one coach at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MemberRole {
    #[serde(rename = "coach")]
    Coach,
    #[serde(rename = "member")]
    Member,
}

/// Roster entry inside a team's member sub-collection, keyed by uid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberEntity {
    /// User id of the member.
    pub uid: String,
    /// Owning team id, duplicated for collection-group lookups.
    pub team_id: String,
    /// Roster role.
    pub role: MemberRole,
    pub joined_at: SystemTime,
}

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchStatus {
    /// Either coach may freely re-propose schedule/location/referee.
    #[serde(rename = "coachs_edit")]
    CoachesEdit,
    /// Awaiting the invited referee's accept/decline; frozen for everyone else.
    #[serde(rename = "refree_waiting")]
    RefereeWaiting,
    /// Referee accepted; waiting for kick-off.
    #[serde(rename = "pending")]
    Pending,
    /// Play underway; only the agreed referee may edit.
    #[serde(rename = "in_progress")]
    InProgress,
    /// Terminal: played to completion.
    #[serde(rename = "finish")]
    Finished,
    /// Terminal: cancelled before play.
    #[serde(rename = "cancled")]
    Cancelled,
}

impl MatchStatus {
    /// Whether the match can never be mutated again.
    pub fn is_terminal(self) -> bool {
        matches!(self, MatchStatus::Finished | MatchStatus::Cancelled)
    }
}

/// Origin of a match.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchKind {
    /// Created from a mutual challenge between two teams.
    #[serde(rename = "classic_match")]
    Classic,
    /// Generated by a tournament bracket; outside the lifecycle engine.
    #[serde(rename = "tournament")]
    Tournament,
}

/// Per-team slice of a match. Owned exclusively by the parent match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamSlot {
    /// Team id.
    pub id: String,
    /// Goals scored; `None` until play begins.
    pub score: Option<i64>,
    /// Whether this team's coach currently accepts the proposed schedule.
    pub agreed: bool,
}

impl TeamSlot {
    /// Fresh slot for a team entering negotiation.
    pub fn new(id: String) -> Self {
        Self {
            id,
            score: None,
            agreed: false,
        }
    }
}

/// Referee assignment slice of a match.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RefereeSlot {
    /// Uid of the invited/assigned referee, if any.
    pub id: Option<String>,
    /// Whether the referee accepted the invitation.
    pub agreed: bool,
}

/// Match record, the central entity of the lifecycle engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchEntity {
    /// Stable id, supplied by the challenge notification rather than the store.
    pub id: String,
    /// Challenger side.
    pub team1: TeamSlot,
    /// Challenged side.
    pub team2: TeamSlot,
    /// Referee assignment.
    pub referee: RefereeSlot,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    /// Scheduled start; unset until both coaches agree.
    pub start_in: Option<SystemTime>,
    /// Set only on completion.
    pub ended_at: Option<SystemTime>,
    /// Mapping-service place deep link.
    pub location: Option<String>,
    /// Current lifecycle status.
    pub status: MatchStatus,
    /// Origin of the match.
    pub kind: MatchKind,
}

impl MatchEntity {
    /// Build a fresh classic match in the initial negotiation state.
    pub fn new_challenge(id: String, team1_id: String, team2_id: String, now: SystemTime) -> Self {
        Self {
            id,
            team1: TeamSlot::new(team1_id),
            team2: TeamSlot::new(team2_id),
            referee: RefereeSlot::default(),
            created_at: now,
            updated_at: now,
            start_in: None,
            ended_at: None,
            location: None,
            status: MatchStatus::CoachesEdit,
            kind: MatchKind::Classic,
        }
    }
}

/// Lifecycle status of a tournament.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TournamentStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "finish")]
    Finished,
    #[serde(rename = "cancled")]
    Cancelled,
}

/// Tournament record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TournamentEntity {
    pub name: String,
    pub logo: String,
    pub description: String,
    pub start_date: SystemTime,
    pub end_date: Option<SystemTime>,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
    pub created_by: String,
    /// Uid of the managing user (account type `tournament_manager`).
    pub manager_id: String,
    /// Uids of referees listed for this tournament.
    pub referee_ids: Vec<String>,
    pub location: String,
    /// Ids of participating teams.
    pub participants: Vec<String>,
    pub status: TournamentStatus,
    /// Roster floor a team must meet to join.
    pub min_members_in_team: u32,
    /// Capacity ceiling for `participants`.
    pub max_participants: u32,
}

/// Terminal action a recipient sets on a notification, exactly once.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationAction {
    #[serde(rename = "accept")]
    Accept,
    #[serde(rename = "decline")]
    Decline,
    #[serde(rename = "view")]
    View,
}

/// Discriminator the dispatcher routes on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationKind {
    /// Informational only; never routed.
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "request_to_join_team")]
    RequestToJoinTeam,
    #[serde(rename = "request_to_join_tournament")]
    RequestToJoinTournament,
    #[serde(rename = "match_chalenge")]
    MatchChallenge,
    #[serde(rename = "refree_invite")]
    RefereeInvite,
    #[serde(rename = "invite_to_team")]
    InviteToTeam,
    #[serde(rename = "invite_to_tournament")]
    InviteToTournament,
    #[serde(rename = "invite_referee_to_tournament")]
    InviteRefereeToTournament,
}

/// Notification record. `from_id`/`to_id` are semantically polymorphic:
/// user, team, match, or tournament ids depending on `kind`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationEntity {
    pub from_id: String,
    pub to_id: String,
    pub title: String,
    pub message: String,
    pub created_at: SystemTime,
    /// Unset at creation; written once by the recipient.
    pub action: Option<NotificationAction>,
    /// Routing discriminator.
    pub kind: NotificationKind,
}

impl NotificationEntity {
    /// Build an informational notification with no action expected.
    pub fn info(
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            title: title.into(),
            message: message.into(),
            created_at: SystemTime::now(),
            action: None,
            kind: NotificationKind::Info,
        }
    }

    /// Build an actionable notification of the given kind.
    pub fn actionable(
        kind: NotificationKind,
        from_id: impl Into<String>,
        to_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            title: title.into(),
            message: message.into(),
            created_at: SystemTime::now(),
            action: None,
            kind,
        }
    }
}
