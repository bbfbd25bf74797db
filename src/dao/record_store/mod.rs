/// In-memory backend, used by tests and local runs without a database.
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    MatchEntity, MatchStatus, MemberEntity, NotificationEntity, TeamEntity, TournamentEntity,
    TournamentStatus, UserEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the external document store.
///
/// Every method is a single-document read or write (or a simple equality /
/// not-in / array-contains query); there are no multi-document transactions.
pub trait RecordStore: Send + Sync {
    /// Fetch a user record by uid.
    fn find_user(&self, uid: &str) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    /// Create or replace a user record.
    fn save_user(&self, uid: &str, user: UserEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Equality query on the unique username field.
    fn find_user_by_username(
        &self,
        username: &str,
    ) -> BoxFuture<'static, StorageResult<Option<(String, UserEntity)>>>;

    /// Insert a team record, generating its id.
    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<String>>;
    /// Fetch a team record by id.
    fn find_team(&self, id: &str) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>>;
    /// Create or replace a team record.
    fn save_team(&self, id: &str, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Equality query on the unique team name field.
    fn find_team_by_name(
        &self,
        team_name: &str,
    ) -> BoxFuture<'static, StorageResult<Option<(String, TeamEntity)>>>;

    /// Fetch one roster entry from a team's member sub-collection.
    fn find_member(
        &self,
        team_id: &str,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Option<MemberEntity>>>;
    /// Create or replace a roster entry.
    fn save_member(&self, member: MemberEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove a roster entry.
    fn delete_member(&self, team_id: &str, uid: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// List a team's full roster.
    fn list_members(&self, team_id: &str)
    -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>>;
    /// Collection-group query: roster entries for a uid across all teams.
    fn memberships_for_user(
        &self,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>>;

    /// Fetch a match record by id.
    fn find_match(&self, id: &str) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>>;
    /// Create or replace a match record (document-level atomic set).
    fn save_match(&self, m: MatchEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Matches where the team plays on either side, excluding the given statuses.
    fn matches_for_team_excluding(
        &self,
        team_id: &str,
        excluded: Vec<MatchStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;
    /// Matches assigned to the referee, excluding the given statuses.
    fn matches_for_referee_excluding(
        &self,
        uid: &str,
        excluded: Vec<MatchStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>>;

    /// Fetch a tournament record by id.
    fn find_tournament(
        &self,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>>;
    /// Create or replace a tournament record.
    fn save_tournament(
        &self,
        id: &str,
        tournament: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Delete a tournament record.
    fn delete_tournament(&self, id: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// Array-contains query on the referee listing.
    fn tournaments_with_referee(
        &self,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>>;
    /// Tournaments managed by the uid, excluding the given statuses.
    fn tournaments_managed_by_excluding(
        &self,
        uid: &str,
        excluded: Vec<TournamentStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>>;

    /// Insert a notification record, generating its id.
    fn insert_notification(
        &self,
        notification: NotificationEntity,
    ) -> BoxFuture<'static, StorageResult<String>>;
    /// Fetch a notification record by id.
    fn find_notification(
        &self,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<NotificationEntity>>>;

    /// Verify backend connectivity.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
