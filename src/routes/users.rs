use axum::{
    Json, Router,
    extract::State,
    routing::{patch, post},
};
use axum_valid::Valid;

use crate::{
    auth::Caller,
    dto::{
        common::Ack,
        user::{ChangeAccountTypeRequest, CreateUserRequest, UpdateUserRequest},
    },
    error::AppError,
    services::user_service,
    state::SharedState,
};

/// Routes covering user account procedures.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/me", patch(update_user))
        .route("/users/me/account-type", post(change_account_type))
}

/// Register the calling identity as a new user.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "User created", body = Ack)
    )
)]
pub async fn create_user(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<CreateUserRequest>>,
) -> Result<Json<Ack>, AppError> {
    user_service::create_user(&state, &caller, payload).await?;
    Ok(Json(Ack::ok()))
}

/// Update the calling user's profile.
#[utoipa::path(
    patch,
    path = "/users/me",
    tag = "users",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = Ack)
    )
)]
pub async fn update_user(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<UpdateUserRequest>>,
) -> Result<Json<Ack>, AppError> {
    user_service::update_user(&state, &caller, payload).await?;
    Ok(Json(Ack::ok()))
}

/// Switch the calling user's account type.
#[utoipa::path(
    post,
    path = "/users/me/account-type",
    tag = "users",
    request_body = ChangeAccountTypeRequest,
    responses(
        (status = 200, description = "Account type changed", body = Ack)
    )
)]
pub async fn change_account_type(
    State(state): State<SharedState>,
    Caller(caller): Caller,
    Valid(Json(payload)): Valid<Json<ChangeAccountTypeRequest>>,
) -> Result<Json<Ack>, AppError> {
    user_service::change_account_type(&state, &caller, payload.account_type).await?;
    Ok(Json(Ack::ok()))
}
