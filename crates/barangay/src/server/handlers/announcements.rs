use axum::extract::State;
use axum::http::StatusCode;
use chrono::Utc;
use serde::Deserialize;

use crate::models::{Announcement, AnnouncementStatus, AnnouncementUpdate, NewAnnouncement};
use crate::server::error::ApiResult;
use crate::server::extract::{Json, Path, Query};
use crate::server::{AdminUser, AppState, AuthUser};

/// Published announcements, for the public board. No sign-in needed.
pub(crate) async fn public(State(state): State<AppState>) -> ApiResult<Json<Vec<Announcement>>> {
    let announcements = state
        .run(|storage| storage.list_public_announcements(Utc::now()))
        .await?;
    Ok(Json(announcements))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListQuery {
    status: Option<AnnouncementStatus>,
}

pub(crate) async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Announcement>>> {
    let announcements = state
        .run(move |storage| storage.list_announcements(query.status))
        .await?;
    Ok(Json(announcements))
}

pub(crate) async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<NewAnnouncement>,
) -> ApiResult<(StatusCode, Json<Announcement>)> {
    let author = user.username().to_string();
    let announcement = state
        .run(move |storage| storage.create_announcement(&input, Some(&author), Utc::now()))
        .await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Announcement>> {
    let announcement = state
        .run(move |storage| storage.get_announcement(id))
        .await?;
    Ok(Json(announcement))
}

pub(crate) async fn update(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
    Json(update): Json<AnnouncementUpdate>,
) -> ApiResult<Json<Announcement>> {
    let announcement = state
        .run(move |storage| storage.update_announcement(id, update, Utc::now()))
        .await?;
    Ok(Json(announcement))
}

pub(crate) async fn archive(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Announcement>> {
    let announcement = state
        .run(move |storage| storage.archive_announcement(id, Utc::now()))
        .await?;
    Ok(Json(announcement))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state
        .run(move |storage| storage.delete_announcement(id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
