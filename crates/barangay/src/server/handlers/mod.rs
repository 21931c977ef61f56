//! Route handlers, one module per record kind.

pub(super) mod accounts;
pub(super) mod announcements;
pub(super) mod auth;
pub(super) mod complaints;
pub(super) mod documents;
pub(super) mod households;
pub(super) mod residents;

use axum::extract::State;
use serde_json::{json, Value};

use super::error::ApiResult;
use super::extract::Json;
use super::{today, AppState, AuthUser};
use crate::storage::RecordStats;

pub(super) async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

pub(super) async fn stats(
    State(state): State<AppState>,
    _user: AuthUser,
) -> ApiResult<Json<RecordStats>> {
    let today = today();
    let stats = state.run(move |storage| storage.stats(today)).await?;
    Ok(Json(stats))
}
