use async_trait::async_trait;

/// Error type for the transactional store.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// The session's transaction was already taken by a commit or rollback.
    #[error("Transaction session is closed")]
    SessionClosed,

    /// A post-commit or post-rollback observer failed.
    #[error("Transaction observer failed: {0}")]
    Observer(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for store operations.
pub type TransactionResult<T> = Result<T, TransactionError>;

/// Trait for components that need to be notified of transaction lifecycle events.
///
/// Observers are registered on a session and invoked only after the database
/// has acknowledged the commit or rollback, so anything they publish reflects
/// durable state.
#[async_trait]
pub trait TransactionAware: Send + Sync {
    /// Called after a successful transaction commit.
    async fn on_commit(&self) -> TransactionResult<()>;

    /// Called after a transaction rollback.
    async fn on_rollback(&self) -> TransactionResult<()>;
}
