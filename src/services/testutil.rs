//! Shared fixtures for service tests, all running against the in-memory store.

use std::time::SystemTime;

use crate::{
    dao::{
        models::{
            AccountType, MatchEntity, MemberEntity, MemberRole, NotificationEntity, TeamEntity,
            UserEntity,
        },
        record_store::{RecordStore, memory::MemoryRecordStore},
    },
    state::{AppState, SharedState},
};
use std::sync::Arc;

/// Fresh shared state backed by an inspectable in-memory store.
pub(crate) fn state_with_memory() -> (SharedState, MemoryRecordStore) {
    let store = MemoryRecordStore::new();
    let state = AppState::with_store(Arc::new(store.clone()));
    (state, store)
}

pub(crate) fn user(username: &str, account_type: AccountType) -> UserEntity {
    UserEntity {
        username: username.to_owned(),
        account_type,
        first_name: None,
        last_name: None,
        bio: None,
        avatar: None,
        birthday: None,
        gender: None,
        address: None,
        phone_numbers: None,
        join_date: Some(SystemTime::now()),
    }
}

pub(crate) fn team(name: &str, created_by: &str) -> TeamEntity {
    TeamEntity {
        team_name: name.to_owned(),
        team_logo: "logo.png".to_owned(),
        description: "test team".to_owned(),
        black_list: Vec::new(),
        created_by: created_by.to_owned(),
        created_at: SystemTime::now(),
        updated_at: SystemTime::now(),
    }
}

pub(crate) async fn seed_user(
    store: &MemoryRecordStore,
    uid: &str,
    username: &str,
    account_type: AccountType,
) {
    store
        .save_user(uid, user(username, account_type))
        .await
        .expect("seed user");
}

pub(crate) async fn seed_member(
    store: &MemoryRecordStore,
    team_id: &str,
    uid: &str,
    role: MemberRole,
) {
    store
        .save_member(MemberEntity {
            uid: uid.to_owned(),
            team_id: team_id.to_owned(),
            role,
            joined_at: SystemTime::now(),
        })
        .await
        .expect("seed member");
}

/// Seed a team with its coach: team record, coach user, coach roster entry.
pub(crate) async fn seed_coached_team(
    store: &MemoryRecordStore,
    team_id: &str,
    team_name: &str,
    coach_uid: &str,
) {
    store
        .save_team(team_id, team(team_name, coach_uid))
        .await
        .expect("seed team");
    seed_user(store, coach_uid, &format!("{team_name}_coach"), AccountType::Coach).await;
    seed_member(store, team_id, coach_uid, MemberRole::Coach).await;
}

/// Seed a classic match ready for negotiation between two coached teams.
pub(crate) async fn seed_challenge_match(store: &MemoryRecordStore, match_id: &str) {
    seed_coached_team(store, "team-1", "red_dragons", "coach-1").await;
    seed_coached_team(store, "team-2", "blue_sharks", "coach-2").await;
    store
        .save_match(MatchEntity::new_challenge(
            match_id.to_owned(),
            "team-1".to_owned(),
            "team-2".to_owned(),
            SystemTime::now(),
        ))
        .await
        .expect("seed match");
}

/// Notifications whose title matches, in insertion order.
pub(crate) fn notifications_titled(
    store: &MemoryRecordStore,
    title: &str,
) -> Vec<NotificationEntity> {
    store
        .notifications()
        .into_iter()
        .map(|(_, n)| n)
        .filter(|n| n.title == title)
        .collect()
}
