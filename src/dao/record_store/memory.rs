use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    models::{
        MatchEntity, MatchStatus, MemberEntity, NotificationEntity, TeamEntity, TournamentEntity,
        TournamentStatus, UserEntity,
    },
    record_store::RecordStore,
    storage::StorageResult,
};

/// Record store backend holding every collection in process memory.
///
/// Not durable; suitable for tests and database-less local runs.
#[derive(Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<Collections>>,
}

#[derive(Default)]
struct Collections {
    users: HashMap<String, UserEntity>,
    teams: HashMap<String, TeamEntity>,
    // Keyed (team_id, uid), mirroring the per-team sub-collection layout.
    members: HashMap<(String, String), MemberEntity>,
    matches: HashMap<String, MatchEntity>,
    tournaments: HashMap<String, TournamentEntity>,
    // Insertion order preserved so callers can inspect emission order.
    notifications: Vec<(String, NotificationEntity)>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every notification in insertion order.
    pub fn notifications(&self) -> Vec<(String, NotificationEntity)> {
        self.inner.lock().expect("store lock").notifications.clone()
    }

    /// Drop all notifications, keeping the other collections intact.
    pub fn clear_notifications(&self) {
        self.inner
            .lock()
            .expect("store lock")
            .notifications
            .clear();
    }

    /// Overwrite a notification in place, as the recipient client would.
    pub fn set_notification(&self, id: &str, notification: NotificationEntity) {
        let mut guard = self.inner.lock().expect("store lock");
        if let Some(entry) = guard.notifications.iter_mut().find(|(nid, _)| nid == id) {
            entry.1 = notification;
        } else {
            guard.notifications.push((id.to_owned(), notification));
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl RecordStore for MemoryRecordStore {
    fn find_user(&self, uid: &str) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        let uid = uid.to_owned();
        Box::pin(async move { Ok(store.inner.lock().expect("store lock").users.get(&uid).cloned()) })
    }

    fn save_user(&self, uid: &str, user: UserEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let uid = uid.to_owned();
        Box::pin(async move {
            store
                .inner
                .lock()
                .expect("store lock")
                .users
                .insert(uid, user);
            Ok(())
        })
    }

    fn find_user_by_username(
        &self,
        username: &str,
    ) -> BoxFuture<'static, StorageResult<Option<(String, UserEntity)>>> {
        let store = self.clone();
        let username = username.to_owned();
        Box::pin(async move {
            let guard = store.inner.lock().expect("store lock");
            Ok(guard
                .users
                .iter()
                .find(|(_, user)| user.username == username)
                .map(|(id, user)| (id.clone(), user.clone())))
        })
    }

    fn insert_team(&self, team: TeamEntity) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            let id = new_id();
            store
                .inner
                .lock()
                .expect("store lock")
                .teams
                .insert(id.clone(), team);
            Ok(id)
        })
    }

    fn find_team(&self, id: &str) -> BoxFuture<'static, StorageResult<Option<TeamEntity>>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move { Ok(store.inner.lock().expect("store lock").teams.get(&id).cloned()) })
    }

    fn save_team(&self, id: &str, team: TeamEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move {
            store
                .inner
                .lock()
                .expect("store lock")
                .teams
                .insert(id, team);
            Ok(())
        })
    }

    fn find_team_by_name(
        &self,
        team_name: &str,
    ) -> BoxFuture<'static, StorageResult<Option<(String, TeamEntity)>>> {
        let store = self.clone();
        let team_name = team_name.to_owned();
        Box::pin(async move {
            let guard = store.inner.lock().expect("store lock");
            Ok(guard
                .teams
                .iter()
                .find(|(_, team)| team.team_name == team_name)
                .map(|(id, team)| (id.clone(), team.clone())))
        })
    }

    fn find_member(
        &self,
        team_id: &str,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Option<MemberEntity>>> {
        let store = self.clone();
        let key = (team_id.to_owned(), uid.to_owned());
        Box::pin(async move {
            Ok(store
                .inner
                .lock()
                .expect("store lock")
                .members
                .get(&key)
                .cloned())
        })
    }

    fn save_member(&self, member: MemberEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let key = (member.team_id.clone(), member.uid.clone());
            store
                .inner
                .lock()
                .expect("store lock")
                .members
                .insert(key, member);
            Ok(())
        })
    }

    fn delete_member(&self, team_id: &str, uid: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = (team_id.to_owned(), uid.to_owned());
        Box::pin(async move {
            store
                .inner
                .lock()
                .expect("store lock")
                .members
                .remove(&key);
            Ok(())
        })
    }

    fn list_members(
        &self,
        team_id: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        let store = self.clone();
        let team_id = team_id.to_owned();
        Box::pin(async move {
            let guard = store.inner.lock().expect("store lock");
            Ok(guard
                .members
                .values()
                .filter(|member| member.team_id == team_id)
                .cloned()
                .collect())
        })
    }

    fn memberships_for_user(
        &self,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<MemberEntity>>> {
        let store = self.clone();
        let uid = uid.to_owned();
        Box::pin(async move {
            let guard = store.inner.lock().expect("store lock");
            Ok(guard
                .members
                .values()
                .filter(|member| member.uid == uid)
                .cloned()
                .collect())
        })
    }

    fn find_match(&self, id: &str) -> BoxFuture<'static, StorageResult<Option<MatchEntity>>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move {
            Ok(store
                .inner
                .lock()
                .expect("store lock")
                .matches
                .get(&id)
                .cloned())
        })
    }

    fn save_match(&self, m: MatchEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .inner
                .lock()
                .expect("store lock")
                .matches
                .insert(m.id.clone(), m);
            Ok(())
        })
    }

    fn matches_for_team_excluding(
        &self,
        team_id: &str,
        excluded: Vec<MatchStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        let team_id = team_id.to_owned();
        Box::pin(async move {
            let guard = store.inner.lock().expect("store lock");
            Ok(guard
                .matches
                .values()
                .filter(|m| m.team1.id == team_id || m.team2.id == team_id)
                .filter(|m| !excluded.contains(&m.status))
                .cloned()
                .collect())
        })
    }

    fn matches_for_referee_excluding(
        &self,
        uid: &str,
        excluded: Vec<MatchStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<MatchEntity>>> {
        let store = self.clone();
        let uid = uid.to_owned();
        Box::pin(async move {
            let guard = store.inner.lock().expect("store lock");
            Ok(guard
                .matches
                .values()
                .filter(|m| m.referee.id.as_deref() == Some(uid.as_str()))
                .filter(|m| !excluded.contains(&m.status))
                .cloned()
                .collect())
        })
    }

    fn find_tournament(
        &self,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<TournamentEntity>>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move {
            Ok(store
                .inner
                .lock()
                .expect("store lock")
                .tournaments
                .get(&id)
                .cloned())
        })
    }

    fn save_tournament(
        &self,
        id: &str,
        tournament: TournamentEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move {
            store
                .inner
                .lock()
                .expect("store lock")
                .tournaments
                .insert(id, tournament);
            Ok(())
        })
    }

    fn delete_tournament(&self, id: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move {
            store
                .inner
                .lock()
                .expect("store lock")
                .tournaments
                .remove(&id);
            Ok(())
        })
    }

    fn tournaments_with_referee(
        &self,
        uid: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        let store = self.clone();
        let uid = uid.to_owned();
        Box::pin(async move {
            let guard = store.inner.lock().expect("store lock");
            Ok(guard
                .tournaments
                .values()
                .filter(|t| t.referee_ids.iter().any(|id| id == &uid))
                .cloned()
                .collect())
        })
    }

    fn tournaments_managed_by_excluding(
        &self,
        uid: &str,
        excluded: Vec<TournamentStatus>,
    ) -> BoxFuture<'static, StorageResult<Vec<TournamentEntity>>> {
        let store = self.clone();
        let uid = uid.to_owned();
        Box::pin(async move {
            let guard = store.inner.lock().expect("store lock");
            Ok(guard
                .tournaments
                .values()
                .filter(|t| t.manager_id == uid)
                .filter(|t| !excluded.contains(&t.status))
                .cloned()
                .collect())
        })
    }

    fn insert_notification(
        &self,
        notification: NotificationEntity,
    ) -> BoxFuture<'static, StorageResult<String>> {
        let store = self.clone();
        Box::pin(async move {
            let id = new_id();
            store
                .inner
                .lock()
                .expect("store lock")
                .notifications
                .push((id.clone(), notification));
            Ok(id)
        })
    }

    fn find_notification(
        &self,
        id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<NotificationEntity>>> {
        let store = self.clone();
        let id = id.to_owned();
        Box::pin(async move {
            let guard = store.inner.lock().expect("store lock");
            Ok(guard
                .notifications
                .iter()
                .find(|(nid, _)| *nid == id)
                .map(|(_, notification)| notification.clone()))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
