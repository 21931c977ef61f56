use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth;
use crate::models::Account;
use crate::server::error::ApiResult;
use crate::server::extract::Json;
use crate::server::{AppState, AuthUser};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    token: String,
    token_type: &'static str,
    expires_at: DateTime<Utc>,
    account: Account,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let now = Utc::now();
    let account = state
        .run(move |storage| auth::authenticate(storage, &request.username, &request.password, now))
        .await?;

    let ttl = state.config.token_ttl();
    let token = state.signer().issue(&account, ttl, now)?;
    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_at: now + ttl,
        account,
    }))
}

pub(crate) async fn me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Account>> {
    let id = user.account_id();
    let account = state
        .run(move |storage| storage.get_account_by_id(id))
        .await?;
    Ok(Json(account))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ForgotPasswordRequest {
    email: String,
}

pub(crate) async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mailer = state.mailer.clone();
    let config = state.config.clone();
    state
        .run(move |storage| {
            auth::request_password_reset(
                storage,
                mailer.as_ref(),
                &config,
                &request.email,
                Utc::now(),
            )
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "If an account uses that address, a reset code has been sent."
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResetPasswordRequest {
    email: String,
    code: String,
    new_password: String,
}

pub(crate) async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> ApiResult<StatusCode> {
    let config = state.config.clone();
    state
        .run(move |storage| {
            auth::reset_password(
                storage,
                &config,
                &request.email,
                &request.code,
                &request.new_password,
                Utc::now(),
            )
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

pub(crate) async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    let id = user.account_id();
    let min = state.config.auth.min_password_length;
    state
        .run(move |storage| {
            auth::change_password(
                storage,
                id,
                &request.current_password,
                &request.new_password,
                min,
            )
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
