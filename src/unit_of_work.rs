use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;

use crate::{Executor, TransactionAware, TransactionError, TransactionResult};

/// Unit of Work pattern for managing database transactions.
///
/// The UnitOfWork manages the lifecycle of database transactions and provides
/// a factory method to create new transaction sessions.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Session: UnitOfWorkSession;

    /// Begin a new transaction session.
    async fn begin(&self) -> TransactionResult<Self::Session>;
}

/// Represents a single database transaction session.
#[async_trait]
pub trait UnitOfWorkSession: Send + Sync {
    /// Get the executor for this session (provides access to the transaction).
    fn executor(&self) -> &Executor;

    /// Register a component that needs to be notified of transaction events.
    fn register_transaction_aware(&self, observer: Arc<dyn TransactionAware>);

    /// Commit the transaction and notify all registered observers.
    async fn commit(self) -> TransactionResult<()>;

    /// Rollback the transaction and notify all registered observers.
    async fn rollback(self) -> TransactionResult<()>;
}

/// Unit of work backed by a PostgreSQL connection pool.
#[derive(Clone, Debug)]
pub struct PostgresUnitOfWork {
    pool: PgPool,
}

impl PostgresUnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    type Session = PostgresUnitOfWorkSession;

    async fn begin(&self) -> TransactionResult<Self::Session> {
        let tx = self.pool.begin().await?;
        Ok(PostgresUnitOfWorkSession::new(tx))
    }
}

/// One open PostgreSQL transaction plus its lifecycle observers.
pub struct PostgresUnitOfWorkSession {
    executor: Executor,
    observers: RwLock<Vec<Arc<dyn TransactionAware>>>,
}

impl PostgresUnitOfWorkSession {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            executor: Executor::new(tx),
            observers: RwLock::new(Vec::new()),
        }
    }

    fn observers(&self) -> Vec<Arc<dyn TransactionAware>> {
        self.observers.read().clone()
    }
}

#[async_trait]
impl UnitOfWorkSession for PostgresUnitOfWorkSession {
    fn executor(&self) -> &Executor {
        &self.executor
    }

    fn register_transaction_aware(&self, observer: Arc<dyn TransactionAware>) {
        self.observers.write().push(observer);
    }

    async fn commit(self) -> TransactionResult<()> {
        let tx = self.executor.take_transaction().await?;

        // A failed COMMIT leaves nothing durable; observers see it as a rollback.
        if let Err(err) = tx.commit().await {
            for observer in self.observers() {
                observer.on_rollback().await?;
            }
            return Err(err.into());
        }

        for observer in self.observers() {
            observer.on_commit().await?;
        }
        Ok(())
    }

    async fn rollback(self) -> TransactionResult<()> {
        let tx = self.executor.take_transaction().await?;
        tx.rollback().await?;

        for observer in self.observers() {
            observer.on_rollback().await?;
        }
        Ok(())
    }
}

/// Finish a unit of work according to the outcome of the work done in it.
///
/// `Ok` commits; `Err` rolls back and returns the original error. A rollback
/// that itself fails is logged and the original error still wins, since the
/// driver discards the transaction when its connection is released anyway.
pub async fn settle<S, T, E>(session: S, outcome: Result<T, E>) -> Result<T, E>
where
    S: UnitOfWorkSession,
    E: From<TransactionError> + std::fmt::Display,
{
    match outcome {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = session.rollback().await {
                tracing::error!(error = %rollback_err, cause = %err, "Rollback failed");
            }
            Err(err)
        }
    }
}
