//! Storefront order service.
//!
//! REST backend for a storefront: accounts, catalog, per-user carts and the
//! order lifecycle. Every multi-row mutation runs inside one PostgreSQL unit
//! of work so order placement and cancellation are all-or-nothing with respect
//! to orders, line items, product stock and cart contents.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod executor;
pub mod http;
pub mod models;
pub mod orders;
pub mod pagination;
pub mod repositories;
pub mod telemetry;
pub mod transaction_aware;
pub mod unit_of_work;

pub use error::{Error, Result};
pub use executor::Executor;
pub use transaction_aware::{TransactionAware, TransactionError, TransactionResult};
pub use unit_of_work::{settle, PostgresUnitOfWork, PostgresUnitOfWorkSession, UnitOfWork, UnitOfWorkSession};
