use std::time::Duration;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{Document, doc},
    options::{ClientOptions, IndexOptions},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::time::sleep;
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::{
    models::{
        MatchEntity, MatchStatus, MemberEntity, NotificationEntity, TeamEntity, TournamentEntity,
        TournamentStatus, UserEntity,
    },
    record_store::RecordStore,
    storage::StorageResult,
};

const USERS: &str = "users";
const TEAMS: &str = "teams";
const MEMBERS: &str = "members";
const MATCHES: &str = "matches";
const TOURNAMENTS: &str = "tournaments";
const NOTIFICATIONS: &str = "notifications";

/// Record store backed by a MongoDB database, one collection per entity.
///
/// The member sub-collections are flattened into a single `members`
/// collection with a unique `(team_id, uid)` index, which keeps the
/// collection-group query a plain equality filter.
#[derive(Clone)]
pub struct MongoRecordStore {
    database: Database,
}

/// Entity stored under a string `_id`, the entity body flattened alongside.
#[derive(Debug, Serialize, Deserialize)]
struct Keyed<T> {
    #[serde(rename = "_id")]
    id: String,
    #[serde(flatten)]
    body: T,
}

fn match_status_str(status: MatchStatus) -> &'static str {
    match status {
        MatchStatus::CoachesEdit => "coachs_edit",
        MatchStatus::RefereeWaiting => "refree_waiting",
        MatchStatus::Pending => "pending",
        MatchStatus::InProgress => "in_progress",
        MatchStatus::Finished => "finish",
        MatchStatus::Cancelled => "cancled",
    }
}

fn tournament_status_str(status: TournamentStatus) -> &'static str {
    match status {
        TournamentStatus::Pending => "pending",
        TournamentStatus::InProgress => "in-progress",
        TournamentStatus::Finished => "finish",
        TournamentStatus::Cancelled => "cancled",
    }
}

const CONNECT_MAX_ATTEMPTS: u32 = 10;

impl MongoRecordStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    ///
    /// Retries the initial ping with exponential backoff so a store that is
    /// still starting up does not fail the whole supervisor cycle.
    pub async fn connect(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;
        let client = Client::with_options(options)
            .map_err(|source| MongoDaoError::ClientConstruction { source })?;
        let database = client.database(db_name.unwrap_or("matchday"));

        let mut attempts = 0;
        let mut delay = Duration::from_millis(250);
        loop {
            match database.run_command(doc! { "ping": 1 }).await {
                Ok(_) => break,
                Err(err) => {
                    attempts += 1;
                    if attempts >= CONNECT_MAX_ATTEMPTS {
                        return Err(MongoDaoError::InitialPing {
                            attempts,
                            source: err,
                        });
                    }
                    sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_secs(5));
                }
            }
        }

        let store = Self { database };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        self.ensure_unique_index(USERS, "username", doc! {"username": 1})
            .await?;
        self.ensure_unique_index(TEAMS, "team_name", doc! {"team_name": 1})
            .await?;
        self.ensure_unique_index(MEMBERS, "team_id,uid", doc! {"team_id": 1, "uid": 1})
            .await?;
        Ok(())
    }

    async fn ensure_unique_index(
        &self,
        collection: &'static str,
        index: &'static str,
        keys: Document,
    ) -> MongoResult<()> {
        let coll = self.database.collection::<Document>(collection);
        let model = mongodb::IndexModel::builder()
            .keys(keys)
            .options(IndexOptions::builder().unique(Some(true)).build())
            .build();
        coll.create_index(model)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection,
                index,
                source,
            })?;
        Ok(())
    }

    fn keyed<T: Send + Sync>(&self, name: &'static str) -> Collection<Keyed<T>> {
        self.database.collection::<Keyed<T>>(name)
    }

    async fn find_by_id<T>(&self, name: &'static str, id: &str) -> MongoResult<Option<T>>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        let document = self
            .keyed::<T>(name)
            .find_one(doc! {"_id": id})
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?;
        Ok(document.map(|keyed| keyed.body))
    }

    async fn upsert<T>(&self, name: &'static str, id: String, body: T) -> MongoResult<()>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        self.keyed::<T>(name)
            .replace_one(doc! {"_id": &id}, &Keyed { id, body })
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: name,
                source,
            })?;
        Ok(())
    }

    async fn find_all<T>(&self, name: &'static str, filter: Document) -> MongoResult<Vec<T>>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        let documents: Vec<Keyed<T>> = self
            .keyed::<T>(name)
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?;
        Ok(documents.into_iter().map(|keyed| keyed.body).collect())
    }

    async fn find_one_keyed<T>(
        &self,
        name: &'static str,
        filter: Document,
    ) -> MongoResult<Option<(String, T)>>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        let document = self
            .keyed::<T>(name)
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: name,
                source,
            })?;
        Ok(document.map(|keyed| (keyed.id, keyed.body)))
    }

    async fn delete_by_filter(&self, name: &'static str, filter: Document) -> MongoResult<()> {
        self.database
            .collection::<Document>(name)
            .delete_one(filter)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: name,
                source,
            })?;
        Ok(())
    }

    async fn ping(&self) -> MongoResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }
}

impl RecordStore for MongoRecordStore {
    fn find_user(&self, uid: &str) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        let uid = uid.to_owned();
        Box::pin(async move { Ok(store.find_by_id(USERS, &uid).await?) })
    }

    fn save_user(&self, uid: &str, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let uid = uid.to_owned();
        Box::pin(async move { Ok(store.upsert(USERS, uid, user).await?) })
    }

    fn find_user_by_username(
        &self,
        username: &str,
    ) -> BoxFuture<'static, StorageResult<Option<(String, UserEntity)>>> {
        let store = self.clone();
        let filter = doc! {"username": username};
        Box::pin(async move { Ok(store.find_one_keyed(USERS, filter).await?) })
    }

    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            let id = Uuid::new_v4().to_string();
            store.upsert(TEAMS, id.clone(), team).await?;
            Ok(id)
        })
    }

    fn find_team(&self, id: &str) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { Ok(store.find_by_id(TEAMS, &id).await?) })
    }

    fn save_team(&self, id: &str, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { Ok(store.upsert(TEAMS, id, team).await?) })
    }

    fn find_team_by_name(
        &self,
        team_name: &str,
    ) -> BoxFuture<'static, StorageResult<Option<(String, TeamEntity)>>> {
        let store = self.clone();
        let filter = doc! {"team_name": team_name};
        Box::pin(async move { Ok(store.find_one_keyed(TEAMS, filter).await?) })
    }

    fn find_member(
        &self,
        team_id: &str,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Option<MemberEntity>>> {
        let store = self.clone();
        let filter = doc! {"team_id": team_id, "uid": uid};
        Box::pin(async move {
            Ok(store
                .find_one_keyed(MEMBERS, filter)
                .await?
                .map(|(_, member)| member))
        })
    }

    fn save_member(&self, member: MemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = format!("{}/{}", member.team_id, member.uid);
            Ok(store.upsert(MEMBERS, id, member).await?)
        })
    }

    fn delete_member(&self, team_id: &str, uid: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let filter = doc! {"team_id": team_id, "uid": uid};
        Box::pin(async move { Ok(store.delete_by_filter(MEMBERS, filter).await?) })
    }

    fn list_members(
        &self,
        team_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        let store = self.clone();
        let filter = doc! {"team_id": team_id};
        Box::pin(async move { Ok(store.find_all(MEMBERS, filter).await?) })
    }

    fn memberships_for_user(
        &self,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        let store = self.clone();
        let filter = doc! {"uid": uid};
        Box::pin(async move { Ok(store.find_all(MEMBERS, filter).await?) })
    }

    fn find_match(&self, id: &str) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { Ok(store.find_by_id(MATCHES, &id).await?) })
    }

    fn save_match(&self, m: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let id = m.id.clone();
            Ok(store.upsert(MATCHES, id, m).await?)
        })
    }

    fn matches_for_team_excluding(
        &self,
        team_id: &str,
        excluded: Vec<MatchStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        let excluded: Vec<&str> = excluded.into_iter().map(match_status_str).collect();
        let filter = doc! {
            "$or": [{"team1.id": team_id}, {"team2.id": team_id}],
            "status": {"$nin": excluded},
        };
        Box::pin(async move { Ok(store.find_all(MATCHES, filter).await?) })
    }

    fn matches_for_referee_excluding(
        &self,
        uid: &str,
        excluded: Vec<MatchStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        let excluded: Vec<&str> = excluded.into_iter().map(match_status_str).collect();
        let filter = doc! {"referee.id": uid, "status": {"$nin": excluded}};
        Box::pin(async move { Ok(store.find_all(MATCHES, filter).await?) })
    }

    fn find_tournament(
        &self,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { Ok(store.find_by_id(TOURNAMENTS, &id).await?) })
    }

    fn save_tournament(
        &self,
        id: &str,
        tournament: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { Ok(store.upsert(TOURNAMENTS, id, tournament).await?) })
    }

    fn delete_tournament(&self, id: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let filter = doc! {"_id": id};
        Box::pin(async move { Ok(store.delete_by_filter(TOURNAMENTS, filter).await?) })
    }

    fn tournaments_with_referee(
        &self,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        let store = self.clone();
        // Equality against an array field is Mongo's array-contains.
        let filter = doc! {"referee_ids": uid};
        Box::pin(async move { Ok(store.find_all(TOURNAMENTS, filter).await?) })
    }

    fn tournaments_managed_by_excluding(
        &self,
        uid: &str,
        excluded: Vec<TournamentStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        let store = self.clone();
        let excluded: Vec<&str> = excluded.into_iter().map(tournament_status_str).collect();
        let filter = doc! {"manager_id": uid, "status": {"$nin": excluded}};
        Box::pin(async move { Ok(store.find_all(TOURNAMENTS, filter).await?) })
    }

    fn insert_notification(
        &self,
        notification: NotificationEntity,
    ) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            let id = Uuid::new_v4().to_string();
            store
                .upsert(NOTIFICATIONS, id.clone(), notification)
                .await?;
            Ok(id)
        })
    }

    fn find_notification(
        &self,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<NotificationEntity>>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { Ok(store.find_by_id(NOTIFICATIONS, &id).await?) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.ping().await?) })
    }
}
