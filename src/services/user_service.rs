use std::time::{Duration, SystemTime};

use rand::{Rng, distr::Alphanumeric};

use crate::{
    dao::{
        models::{AccountType, Gender, MatchStatus, TournamentStatus, UserEntity},
        record_store::RecordStore,
    },
    dto::{
        user::{CreateUserRequest, UpdateUserRequest},
        validation::validate_handle,
    },
    error::ServiceError,
    state::SharedState,
};

const HANDLE_MIN: usize = 4;
const HANDLE_MAX: usize = 30;

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Coerce an arbitrary requested username into the valid handle alphabet.
fn normalize_username(requested: &str) -> String {
    let mut username: String = requested
        .to_lowercase()
        .chars()
        .filter(|c| matches!(c, 'a'..='z' | '0'..='9' | '_'))
        .collect();
    while username.len() < HANDLE_MIN {
        username.push_str(&random_suffix());
    }
    username.truncate(HANDLE_MAX);
    username
}

/// Find a free username, appending random suffixes until no record claims it.
async fn dedupe_username(
    store: &dyn RecordStore,
    mut username: String,
) -> Result<String, ServiceError> {
    while store.find_user_by_username(&username).await?.is_some() {
        username.truncate(HANDLE_MAX - 6);
        username.push_str(&random_suffix());
    }
    Ok(username)
}

/// Register the calling identity as a fresh user record.
///
/// The requested username is normalized and de-duplicated rather than
/// rejected; the account starts as a plain `user`.
pub async fn create_user(
    state: &SharedState,
    caller: &str,
    request: CreateUserRequest,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    if store.find_user(caller).await?.is_some() {
        return Err(ServiceError::FailedPrecondition("the user already exists".into()));
    }

    let username = dedupe_username(store.as_ref(), normalize_username(&request.username)).await?;

    store
        .save_user(
            caller,
            UserEntity {
                username,
                account_type: AccountType::User,
                first_name: request.first_name,
                last_name: request.last_name,
                bio: None,
                avatar: request.avatar,
                birthday: None,
                gender: Some(Gender::Male),
                address: None,
                phone_numbers: None,
                join_date: Some(SystemTime::now()),
            },
        )
        .await?;

    Ok(())
}

/// Update profile fields on the calling user's record.
pub async fn update_user(
    state: &SharedState,
    caller: &str,
    request: UpdateUserRequest,
) -> Result<(), ServiceError> {
    if request.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "at least one field to update is required".into(),
        ));
    }

    let store = state.require_record_store().await?;

    let Some(mut user) = store.find_user(caller).await? else {
        return Err(ServiceError::FailedPrecondition("the user does not exist".into()));
    };

    if let Some(ref username) = request.username {
        validate_handle(username)
            .map_err(|_| ServiceError::InvalidArgument("invalid username".into()))?;
        if let Some((existing_id, _)) = store.find_user_by_username(username).await? {
            if existing_id != caller {
                return Err(ServiceError::AlreadyExists("username is already taken".into()));
            }
        }
    }

    if let Some(username) = request.username {
        user.username = username;
    }
    if let Some(first_name) = request.first_name {
        user.first_name = Some(first_name);
    }
    if let Some(last_name) = request.last_name {
        user.last_name = Some(last_name);
    }
    if let Some(bio) = request.bio {
        user.bio = Some(bio);
    }
    if let Some(avatar) = request.avatar {
        user.avatar = Some(avatar);
    }
    if let Some(birthday_ms) = request.birthday_ms {
        if birthday_ms > 0 {
            user.birthday =
                Some(SystemTime::UNIX_EPOCH + Duration::from_millis(birthday_ms as u64));
        }
    }
    if let Some(gender) = request.gender {
        user.gender = Some(gender);
    }
    if let Some(address) = request.address {
        user.address = Some(address);
    }
    if let Some(phone_numbers) = request.phone_numbers {
        user.phone_numbers = Some(phone_numbers);
    }
    store.save_user(caller, user).await?;

    Ok(())
}

/// Switch the calling user's account type, gated on outstanding obligations.
///
/// Leaving `coach`/`player` requires no team membership; leaving `refree`
/// requires no live match assignment (anything past `coachs_edit` that is
/// not terminal) and no tournament listing; leaving `tournament_manager`
/// requires no live tournament under management. An unchanged type is a
/// no-op success.
pub async fn change_account_type(
    state: &SharedState,
    caller: &str,
    account_type: AccountType,
) -> Result<(), ServiceError> {
    let store = state.require_record_store().await?;

    let Some(mut user) = store.find_user(caller).await? else {
        return Err(ServiceError::FailedPrecondition("the user does not exist".into()));
    };

    if user.account_type == account_type {
        return Ok(());
    }

    match user.account_type {
        AccountType::Coach | AccountType::Player => {
            if !store.memberships_for_user(caller).await?.is_empty() {
                return Err(ServiceError::FailedPrecondition(
                    "the user is still a member of a team".into(),
                ));
            }
        }
        AccountType::Referee => {
            let live_assignments = store
                .matches_for_referee_excluding(
                    caller,
                    vec![
                        MatchStatus::Finished,
                        MatchStatus::Cancelled,
                        MatchStatus::CoachesEdit,
                    ],
                )
                .await?;
            if !live_assignments.is_empty() {
                return Err(ServiceError::FailedPrecondition(
                    "the user is the referee of a match that is still live".into(),
                ));
            }
            if !store.tournaments_with_referee(caller).await?.is_empty() {
                return Err(ServiceError::FailedPrecondition(
                    "the user is listed as a referee on a tournament".into(),
                ));
            }
        }
        AccountType::TournamentManager => {
            let live_tournaments = store
                .tournaments_managed_by_excluding(
                    caller,
                    vec![TournamentStatus::Finished, TournamentStatus::Cancelled],
                )
                .await?;
            if !live_tournaments.is_empty() {
                return Err(ServiceError::FailedPrecondition(
                    "the user manages a tournament that is still live".into(),
                ));
            }
        }
        AccountType::User => {}
    }

    user.account_type = account_type;
    store.save_user(caller, user).await?;

    Ok(())
}
