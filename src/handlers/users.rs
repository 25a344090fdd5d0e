//! Own profile and admin user management.

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::model::Role;
use crate::response::{success_one_ok, success_page};
use crate::service::{ProfileUpdate, User, UserFilter, UserResponse, UserStore};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

const ADMIN: &[Role] = &[Role::Admin];

#[derive(Debug, Default, Deserialize)]
pub struct UserListParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub q: Option<String>,
    pub role: Option<Role>,
}

pub async fn me(caller: CurrentUser) -> Result<impl IntoResponse, AppError> {
    Ok(success_one_ok(UserResponse::from(caller.0)))
}

pub async fn update_me(
    State(state): State<AppState>,
    caller: CurrentUser,
    Json(body): Json<ProfileUpdate>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;
    let user = UserStore::update_profile(&state.pool, caller.id(), &body)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".into()))?;
    tracing::info!(user_id = user.id, "profile updated");
    Ok(success_one_ok(UserResponse::from(user)))
}

pub async fn list(
    State(state): State<AppState>,
    caller: CurrentUser,
    Query(params): Query<UserListParams>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_any(ADMIN)?;
    let (skip, limit) = state.settings.pagination.resolve(params.skip, params.limit);
    let filter = UserFilter {
        search: params.q.map(|q| q.trim().to_string()).filter(|q| !q.is_empty()),
        role: params.role,
    };
    let users = UserStore::list(&state.pool, &filter, skip, limit).await?;
    let total = UserStore::count(&state.pool, &filter).await?;
    let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(success_page(data, total, skip, limit))
}

fn found(user: Option<User>) -> Result<impl IntoResponse, AppError> {
    let user = user.ok_or_else(|| AppError::NotFound("Usuário não encontrado".into()))?;
    Ok(success_one_ok(UserResponse::from(user)))
}

pub async fn read(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_any(ADMIN)?;
    found(UserStore::by_id(&state.pool, id).await?)
}

pub async fn activate(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_any(ADMIN)?;
    let user = UserStore::set_active(&state.pool, id, true).await?;
    tracing::info!(user_id = id, by = caller.id(), "user activated");
    found(user)
}

pub async fn deactivate(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_any(ADMIN)?;
    if id == caller.id() {
        return Err(AppError::BadRequest("Você não pode desativar sua própria conta".into()));
    }
    let user = UserStore::set_active(&state.pool, id, false).await?;
    tracing::info!(user_id = id, by = caller.id(), "user deactivated");
    found(user)
}

pub async fn verify_email(
    State(state): State<AppState>,
    caller: CurrentUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_any(ADMIN)?;
    found(UserStore::set_verified(&state.pool, id).await?)
}
