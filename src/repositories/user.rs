use uuid::Uuid;

use crate::models::{Role, User};
use crate::{Executor, TransactionError, TransactionResult};

const COLUMNS: &str = "id, name, email, password_hash, role, created_at";

pub struct UserRepository {
    executor: Executor,
}

impl UserRepository {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// Insert a user. `Ok(None)` when the email is already registered.
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> TransactionResult<Option<User>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, name, email, password_hash, role)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (email) DO NOTHING
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> TransactionResult<Option<User>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: Uuid) -> TransactionResult<Option<User>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let user = sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(user)
    }

    pub async fn set_role(&self, id: Uuid, role: Role) -> TransactionResult<Option<User>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(user)
    }
}
