use axum::extract::State;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::models::{DocumentFilter, DocumentRequest, NewDocumentRequest};
use crate::render::{export_csv, render_certificate};
use crate::server::error::ApiResult;
use crate::server::extract::{Json, Path, Query};
use crate::server::{today, AppState, AuthUser};

pub(crate) async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(filter): Query<DocumentFilter>,
) -> ApiResult<Json<Vec<DocumentRequest>>> {
    let documents = state
        .run(move |storage| storage.list_documents(&filter))
        .await?;
    Ok(Json(documents))
}

pub(crate) async fn request(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<NewDocumentRequest>,
) -> ApiResult<(StatusCode, Json<DocumentRequest>)> {
    let fee = state.config.fee_for(input.document_type);
    let today = today();
    let document = state
        .run(move |storage| storage.request_document(&input, fee, today))
        .await?;
    Ok((StatusCode::CREATED, Json(document)))
}

pub(crate) async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<Json<DocumentRequest>> {
    let document = state
        .run(move |storage| storage.get_document(&number))
        .await?;
    Ok(Json(document))
}

pub(crate) async fn approve(
    State(state): State<AppState>,
    user: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<Json<DocumentRequest>> {
    let username = user.username().to_string();
    let document = state
        .run(move |storage| storage.approve_document(&number, &username))
        .await?;
    Ok(Json(document))
}

#[derive(Debug, Deserialize)]
pub(crate) struct Rejection {
    remarks: String,
}

pub(crate) async fn reject(
    State(state): State<AppState>,
    user: AuthUser,
    Path(number): Path<String>,
    Json(rejection): Json<Rejection>,
) -> ApiResult<Json<DocumentRequest>> {
    let username = user.username().to_string();
    let document = state
        .run(move |storage| storage.reject_document(&number, &username, &rejection.remarks))
        .await?;
    Ok(Json(document))
}

pub(crate) async fn release(
    State(state): State<AppState>,
    user: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<Json<DocumentRequest>> {
    let username = user.username().to_string();
    let validity_days = state.config.documents.validity_days;
    let today = today();
    let document = state
        .run(move |storage| storage.release_document(&number, &username, validity_days, today))
        .await?;
    Ok(Json(document))
}

pub(crate) async fn certificate(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(number): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let config = state.config.clone();
    let text = state
        .run(move |storage| {
            let document = storage.get_document(&number)?;
            let resident = storage.get_resident(&document.resident_code)?;
            render_certificate(&config.barangay, &document, &resident)
        })
        .await?;
    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

pub(crate) async fn export(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<impl IntoResponse> {
    let rows = state
        .run(|storage| storage.released_documents())
        .await?;
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                CONTENT_DISPOSITION,
                "attachment; filename=\"released-documents.csv\"",
            ),
        ],
        export_csv(&rows),
    ))
}
