use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::extract::{AdminUser, CurrentUser, JsonBody, PathId, QueryParams};
use super::AppState;
use crate::models::PlaceOrder;
use crate::orders::OrderQuery;
use crate::Result;

#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

impl OrderListParams {
    fn into_query(self) -> Result<OrderQuery> {
        OrderQuery::from_params(self.page, self.limit, self.status.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

pub async fn place(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(request): JsonBody<PlaceOrder>,
) -> Result<(StatusCode, Json<Value>)> {
    let order = state.orders().place_order(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "order": order }))))
}

pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    QueryParams(params): QueryParams<OrderListParams>,
) -> Result<Json<Value>> {
    let orders = state.orders().list_orders(user.user_id, params.into_query()?).await?;
    Ok(Json(json!({ "orders": orders.items, "meta": orders.meta })))
}

pub async fn detail(State(state): State<AppState>, user: CurrentUser, PathId(id): PathId) -> Result<Json<Value>> {
    let order = state.orders().order_detail(user.user_id, id).await?;
    Ok(Json(json!({ "order": order })))
}

pub async fn cancel(State(state): State<AppState>, user: CurrentUser, PathId(id): PathId) -> Result<Json<Value>> {
    let order = state.orders().cancel_order(user.user_id, id).await?;
    Ok(Json(json!({ "order": order })))
}

pub async fn list_all(
    State(state): State<AppState>,
    _admin: AdminUser,
    QueryParams(params): QueryParams<OrderListParams>,
) -> Result<Json<Value>> {
    let orders = state.orders().list_all_orders(params.into_query()?).await?;
    Ok(Json(json!({ "orders": orders.items, "meta": orders.meta })))
}

pub async fn update_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    PathId(id): PathId,
    JsonBody(request): JsonBody<StatusUpdate>,
) -> Result<Json<Value>> {
    let order = state.orders().update_status(id, &request.status).await?;
    Ok(Json(json!({ "order": order })))
}
