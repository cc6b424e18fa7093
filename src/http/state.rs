//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::{AuthService, TokenService};
use crate::cart::CartService;
use crate::catalog::CatalogService;
use crate::orders::{LogEventSink, OrderEventSink, OrderService};
use crate::PostgresUnitOfWork;

/// Cheaply cloneable handle to the services behind the router.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pool: PgPool,
    auth: AuthService,
    catalog: CatalogService,
    carts: CartService,
    orders: OrderService,
}

impl AppState {
    pub fn new(pool: PgPool, tokens: TokenService) -> Self {
        Self::with_event_sink(pool, tokens, Arc::new(LogEventSink))
    }

    /// Build state whose order service publishes committed events to `events`.
    pub fn with_event_sink(pool: PgPool, tokens: TokenService, events: Arc<dyn OrderEventSink>) -> Self {
        let uow = PostgresUnitOfWork::new(pool.clone());
        Self {
            inner: Arc::new(AppStateInner {
                auth: AuthService::new(uow.clone(), tokens),
                catalog: CatalogService::new(uow.clone()),
                carts: CartService::new(uow.clone()),
                orders: OrderService::with_event_sink(uow, events),
                pool,
            }),
        }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn carts(&self) -> &CartService {
        &self.inner.carts
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}
