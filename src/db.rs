//! Connection pool and schema bootstrap.
//!
//! ## Tables
//!
//! - `users` - accounts with an `user_role`
//! - `products` - catalog with non-negative `stock`
//! - `carts` / `cart_items` - one cart per user, one line per product
//! - `orders` / `order_items` - placed orders with price snapshots

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const SCHEMA: &str = include_str!("../schema.sql");

/// Create a `PostgreSQL` connection pool.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create enums, tables and indexes that do not exist yet.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    tracing::info!("Database schema applied");
    Ok(())
}
