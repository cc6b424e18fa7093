use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::{TransactionError, TransactionResult};

/// Shared handle to the open transaction of one unit of work.
///
/// Every repository built for a session holds a clone, so all of their
/// statements run on the same connection and commit or roll back together.
#[derive(Clone, Debug)]
pub struct Executor {
    tx: Arc<Mutex<Option<Transaction<'static, Postgres>>>>,
}

impl Executor {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Lock the transaction for a statement.
    ///
    /// The slot is `None` once the session has been committed or rolled back.
    /// Statements are issued as:
    ///
    /// ```ignore
    /// let mut tx_guard = executor.lock().await;
    /// let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
    /// query.execute(&mut **tx).await?;
    /// ```
    pub async fn lock(&self) -> MutexGuard<'_, Option<Transaction<'static, Postgres>>> {
        self.tx.lock().await
    }

    /// Takes ownership of the transaction, leaving the session closed.
    pub(crate) async fn take_transaction(&self) -> TransactionResult<Transaction<'static, Postgres>> {
        self.tx
            .lock()
            .await
            .take()
            .ok_or(TransactionError::SessionClosed)
    }
}
