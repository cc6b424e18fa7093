use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::extract::{AdminUser, JsonBody, PathId, QueryParams};
use super::AppState;
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::pagination::Page;
use crate::Result;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    QueryParams(params): QueryParams<ProductListParams>,
) -> Result<Json<Value>> {
    let page = Page::new(params.page, params.limit);
    let products = state.catalog().list(params.search.as_deref(), page).await?;
    Ok(Json(json!({ "products": products.items, "meta": products.meta })))
}

pub async fn get(State(state): State<AppState>, PathId(id): PathId) -> Result<Json<Product>> {
    Ok(Json(state.catalog().get(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    JsonBody(product): JsonBody<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = state.catalog().create(product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    PathId(id): PathId,
    JsonBody(update): JsonBody<ProductUpdate>,
) -> Result<Json<Product>> {
    Ok(Json(state.catalog().update(id, update).await?))
}

pub async fn delete(State(state): State<AppState>, _admin: AdminUser, PathId(id): PathId) -> Result<Json<Value>> {
    state.catalog().delete(id).await?;
    Ok(Json(json!({ "message": "Product deleted" })))
}
