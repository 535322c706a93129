use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    api::ApiResponse,
    error::{RepositoryError, RepositoryResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
    users::dto::{
        CreateUserDto, CreateUserResponseDto, DeleteUserResponseDto, ListUsersQuery, LoginUserDto,
        LoginUserResponseDto, ToggleActiveQuery, ToggleUserActiveResponseDto, UpdateUserDto,
        UpdateUserResponseDto, UserResponseDto, UserRoleDto, UserRoleResponseDto,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/User/AddUser", post(add_user))
        .route("/User/AssignRole", post(assign_role))
        .route("/User/AllUsers", get(list_users))
        .route("/User/GetUser/:user_id", get(get_user))
        .route("/User/Update/:id", put(update_user))
        .route("/User/Delete/:id", delete(delete_user))
        .route("/User/Login", post(login_user))
        .route("/User/ToggleActive", post(toggle_active))
}

fn status_for(err: &RepositoryError, rejected: StatusCode) -> StatusCode {
    if err.is_infrastructure() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        rejected
    }
}

/// Wraps the flattened record in the envelope, choosing the status from the
/// failure kind before it is flattened away.
fn reply<T, D: Serialize>(
    result: RepositoryResult<T>,
    rejected: StatusCode,
    flatten: impl FnOnce(RepositoryResult<T>) -> D,
) -> ApiResponse<D> {
    let failure = result
        .as_ref()
        .err()
        .map(|e| (status_for(e, rejected), e.to_string()));
    let data = flatten(result);
    match failure {
        None => ApiResponse::ok(data),
        Some((status, message)) => ApiResponse::failure(status, Some(data), message),
    }
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn add_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateUserDto>,
) -> ApiResponse<CreateUserResponseDto> {
    let result = state.users.add_user(&payload).await;
    if let Ok(user_id) = &result {
        info!(user_id, "user created");
    }
    reply(result, StatusCode::BAD_REQUEST, CreateUserResponseDto::from)
}

#[instrument(skip(state, payload))]
pub async fn assign_role(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<UserRoleDto>,
) -> ApiResponse<UserRoleResponseDto> {
    let result = state.users.assign_role(&payload).await;
    reply(result, StatusCode::BAD_REQUEST, UserRoleResponseDto::from)
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListUsersQuery>,
) -> ApiResponse<Vec<UserResponseDto>> {
    match state.users.list_users(query.is_active).await {
        Ok(users) => ApiResponse::ok(users),
        Err(e) => ApiResponse::failure(status_for(&e, StatusCode::BAD_REQUEST), None, e.to_string()),
    }
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i32>,
) -> ApiResponse<UserResponseDto> {
    match state.users.get_user_by_id(user_id).await {
        Ok(Some(user)) => ApiResponse::ok(user),
        Ok(None) => ApiResponse::failure(StatusCode::NOT_FOUND, None, "User not found."),
        Err(e) => ApiResponse::failure(status_for(&e, StatusCode::BAD_REQUEST), None, e.to_string()),
    }
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateUserDto>,
) -> ApiResponse<UpdateUserResponseDto> {
    if id != payload.user_id {
        warn!(path_id = id, body_id = payload.user_id, "user id mismatch");
        let result: RepositoryResult<()> =
            Err(RepositoryError::Rejected("Mismatched User ID".into()));
        return reply(result, StatusCode::BAD_REQUEST, |r| UpdateUserResponseDto::new(id, r));
    }
    let result = state.users.update_user(&payload).await;
    reply(result, StatusCode::BAD_REQUEST, |r| UpdateUserResponseDto::new(id, r))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> ApiResponse<DeleteUserResponseDto> {
    let result = state.users.delete_user(id).await;
    reply(result, StatusCode::BAD_REQUEST, DeleteUserResponseDto::from)
}

#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginUserDto>,
) -> ApiResponse<LoginUserResponseDto> {
    let result = state.users.login_user(&payload).await;
    match &result {
        Ok(user_id) => info!(user_id, "user logged in"),
        Err(e) if !e.is_infrastructure() => warn!("login rejected"),
        Err(_) => {}
    }
    reply(result, StatusCode::UNAUTHORIZED, LoginUserResponseDto::from)
}

#[instrument(skip(state))]
pub async fn toggle_active(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ToggleActiveQuery>,
) -> ApiResponse<ToggleUserActiveResponseDto> {
    let result = state
        .users
        .toggle_user_active(query.user_id, query.is_active)
        .await;
    reply(result, StatusCode::BAD_REQUEST, ToggleUserActiveResponseDto::from)
}
