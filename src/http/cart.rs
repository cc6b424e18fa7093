use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use super::extract::{CurrentUser, JsonBody, PathId};
use super::AppState;
use crate::models::{AddCartItem, UpdateCartItem};
use crate::Result;

pub async fn view(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Value>> {
    let cart = state.carts().view(user.user_id).await?;
    let total = cart.total();
    Ok(Json(json!({ "cart": cart, "total": total })))
}

pub async fn add(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(request): JsonBody<AddCartItem>,
) -> Result<Json<Value>> {
    let item = state.carts().add_item(user.user_id, request).await?;
    Ok(Json(json!({ "item": item })))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    PathId(item_id): PathId,
    JsonBody(request): JsonBody<UpdateCartItem>,
) -> Result<Json<Value>> {
    let item = state.carts().update_item(user.user_id, item_id, request.quantity).await?;
    Ok(Json(json!({ "item": item })))
}

pub async fn remove(State(state): State<AppState>, user: CurrentUser, PathId(item_id): PathId) -> Result<Json<Value>> {
    state.carts().remove_item(user.user_id, item_id).await?;
    Ok(Json(json!({ "message": "Item removed from cart" })))
}

pub async fn clear(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Value>> {
    let removed = state.carts().clear(user.user_id).await?;
    Ok(Json(json!({ "removed": removed })))
}
