use axum::extract::State;
use axum::http::StatusCode;

use crate::models::{Household, HouseholdDetail, HouseholdFilter, HouseholdUpdate, NewHousehold};
use crate::server::error::ApiResult;
use crate::server::extract::{Json, Path, Query};
use crate::server::{AdminUser, AppState, AuthUser};

pub(crate) async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<HouseholdFilter>,
) -> ApiResult<Json<Vec<Household>>> {
    let households = state
        .run(move |storage| storage.list_households(&filter))
        .await?;
    Ok(Json(households))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<NewHousehold>,
) -> ApiResult<(StatusCode, Json<Household>)> {
    let household = state
        .run(move |storage| storage.create_household(&input))
        .await?;
    Ok((StatusCode::CREATED, Json(household)))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(code): Path<String>,
) -> ApiResult<Json<HouseholdDetail>> {
    let household = state
        .run(move |storage| storage.get_household(&code))
        .await?;
    Ok(Json(household))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(code): Path<String>,
    Json(update): Json<HouseholdUpdate>,
) -> ApiResult<Json<Household>> {
    let household = state
        .run(move |storage| storage.update_household(&code, update))
        .await?;
    Ok(Json(household))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(code): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .run(move |storage| storage.delete_household(&code))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn add_member(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((code, resident)): Path<(String, String)>,
) -> ApiResult<Json<HouseholdDetail>> {
    let household = state
        .run(move |storage| storage.add_household_member(&code, &resident))
        .await?;
    Ok(Json(household))
}

pub(crate) async fn remove_member(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((code, resident)): Path<(String, String)>,
) -> ApiResult<Json<HouseholdDetail>> {
    let household = state
        .run(move |storage| storage.remove_household_member(&code, &resident))
        .await?;
    Ok(Json(household))
}

pub(crate) async fn set_head(
    State(state): State<AppState>,
    _user: AuthUser,
    Path((code, resident)): Path<(String, String)>,
) -> ApiResult<Json<HouseholdDetail>> {
    let household = state
        .run(move |storage| storage.set_household_head(&code, &resident))
        .await?;
    Ok(Json(household))
}
