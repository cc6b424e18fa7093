use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::extract::{CurrentUser, JsonBody};
use super::AppState;
use crate::models::NewUser;
use crate::Result;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<NewUser>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = state.auth().register(request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

pub async fn login(State(state): State<AppState>, JsonBody(request): JsonBody<LoginRequest>) -> Result<Json<Value>> {
    let token = state.auth().login(&request.email, &request.password).await?;
    Ok(Json(json!({ "token": token })))
}

pub async fn profile(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Value>> {
    let user = state.auth().profile(user.user_id).await?;
    Ok(Json(json!({ "user": user })))
}
