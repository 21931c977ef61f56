use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::auth;
use crate::error::Error;
use crate::models::{Account, NewAccount, Role};
use crate::server::error::ApiResult;
use crate::server::extract::{Json, Path};
use crate::server::{AdminUser, AppState};

pub(crate) async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<Account>>> {
    let accounts = state.run(|storage| storage.list_accounts()).await?;
    Ok(Json(accounts))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(input): Json<NewAccount>,
) -> ApiResult<(StatusCode, Json<Account>)> {
    let min = state.config.auth.min_password_length;
    let account = state
        .run(move |storage| auth::create_account(storage, &input, min))
        .await?;
    Ok((StatusCode::CREATED, Json(account)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveChange {
    active: bool,
}

pub(crate) async fn set_active(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(username): Path<String>,
    Json(change): Json<ActiveChange>,
) -> ApiResult<Json<Account>> {
    if !change.active && username == admin.username() {
        return Err(Error::validation("you cannot deactivate your own account").into());
    }
    let account = state
        .run(move |storage| storage.set_account_active(&username, change.active))
        .await?;
    Ok(Json(account))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RoleChange {
    role: Role,
}

pub(crate) async fn set_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(username): Path<String>,
    Json(change): Json<RoleChange>,
) -> ApiResult<Json<Account>> {
    if change.role != Role::Admin && username == admin.username() {
        return Err(Error::validation("you cannot remove your own admin role").into());
    }
    let account = state
        .run(move |storage| storage.set_account_role(&username, change.role))
        .await?;
    Ok(Json(account))
}
