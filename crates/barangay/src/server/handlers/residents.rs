use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use crate::models::{NewResident, Resident, ResidentFilter, ResidentStatus, ResidentUpdate};
use crate::server::error::ApiResult;
use crate::server::extract::{Json, Path, Query};
use crate::server::{today, AdminUser, AppState, AuthUser};

pub(crate) async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<ResidentFilter>,
) -> ApiResult<Json<Vec<Resident>>> {
    let today = today();
    let residents = state
        .run(move |storage| storage.list_residents(&filter, today))
        .await?;
    Ok(Json(residents))
}

pub(crate) async fn register(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<NewResident>,
) -> ApiResult<(StatusCode, Json<Resident>)> {
    let today = today();
    let resident = state
        .run(move |storage| storage.register_resident(&input, today))
        .await?;
    Ok((StatusCode::CREATED, Json(resident)))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(code): Path<String>,
) -> ApiResult<Json<Resident>> {
    let resident = state
        .run(move |storage| storage.get_resident(&code))
        .await?;
    Ok(Json(resident))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(code): Path<String>,
    Json(update): Json<ResidentUpdate>,
) -> ApiResult<Json<Resident>> {
    let today = today();
    let resident = state
        .run(move |storage| storage.update_resident(&code, update, today))
        .await?;
    Ok(Json(resident))
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    status: ResidentStatus,
}

pub(crate) async fn set_status(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(code): Path<String>,
    Json(change): Json<StatusChange>,
) -> ApiResult<Json<Resident>> {
    let resident = state
        .run(move |storage| storage.set_resident_status(&code, change.status))
        .await?;
    Ok(Json(resident))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(code): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .run(move |storage| storage.delete_resident(&code))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
