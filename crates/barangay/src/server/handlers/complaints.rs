use axum::extract::State;
use axum::http::StatusCode;

use crate::models::{Complaint, ComplaintFilter, ComplaintTransition, NewComplaint};
use crate::server::error::ApiResult;
use crate::server::extract::{Json, Path, Query};
use crate::server::{today, AdminUser, AppState, AuthUser};

pub(crate) async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<ComplaintFilter>,
) -> ApiResult<Json<Vec<Complaint>>> {
    let complaints = state
        .run(move |storage| storage.list_complaints(&filter))
        .await?;
    Ok(Json(complaints))
}

pub(crate) async fn file(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<NewComplaint>,
) -> ApiResult<(StatusCode, Json<Complaint>)> {
    let today = today();
    let complaint = state
        .run(move |storage| storage.file_complaint(&input, today))
        .await?;
    Ok((StatusCode::CREATED, Json(complaint)))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(case_number): Path<String>,
) -> ApiResult<Json<Complaint>> {
    let complaint = state
        .run(move |storage| storage.get_complaint(&case_number))
        .await?;
    Ok(Json(complaint))
}

pub(crate) async fn transition(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(case_number): Path<String>,
    Json(transition): Json<ComplaintTransition>,
) -> ApiResult<Json<Complaint>> {
    let complaint = state
        .run(move |storage| storage.transition_complaint(&case_number, &transition))
        .await?;
    Ok(Json(complaint))
}

pub(crate) async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(case_number): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .run(move |storage| storage.delete_complaint(&case_number))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
