use uuid::Uuid;

use crate::models::{NewProduct, Product, ProductUpdate};
use crate::pagination::Page;
use crate::{Executor, TransactionError, TransactionResult};

const COLUMNS: &str = "id, name, description, price, stock, created_at, updated_at";

pub struct ProductRepository {
    executor: Executor,
}

impl ProductRepository {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub async fn create(&self, product: &NewProduct) -> TransactionResult<Product> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let created = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (id, name, description, price, stock)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock)
        .fetch_one(&mut **tx)
        .await?;
        Ok(created)
    }

    pub async fn find_by_id(&self, id: Uuid) -> TransactionResult<Option<Product>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(product)
    }

    /// Read the product and hold its row lock until the transaction ends.
    ///
    /// Concurrent stock movements on the same product queue behind this lock,
    /// so the stock returned here stays authoritative for the rest of the
    /// transaction.
    pub async fn lock_by_id(&self, id: Uuid) -> TransactionResult<Option<Product>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM products WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(product)
    }

    pub async fn list(&self, search: Option<&str>, page: Page) -> TransactionResult<Vec<Product>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {COLUMNS} FROM products
             WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\\')
             ORDER BY created_at DESC, id
             OFFSET $2 LIMIT $3"
        ))
        .bind(search.map(contains_pattern))
        .bind(page.offset())
        .bind(page.limit)
        .fetch_all(&mut **tx)
        .await?;
        Ok(products)
    }

    pub async fn count(&self, search: Option<&str>) -> TransactionResult<i64> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products
             WHERE ($1::text IS NULL OR name ILIKE $1 ESCAPE '\\')",
        )
        .bind(search.map(contains_pattern))
        .fetch_one(&mut **tx)
        .await?;
        Ok(total)
    }

    pub async fn update(&self, id: Uuid, update: &ProductUpdate) -> TransactionResult<Option<Product>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products SET
                 name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 price = COALESCE($4, price),
                 stock = COALESCE($5, stock),
                 updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.price)
        .bind(update.stock)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(product)
    }

    pub async fn delete(&self, id: Uuid) -> TransactionResult<bool> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn is_ordered(&self, id: Uuid) -> TransactionResult<bool> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let ordered: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM order_items WHERE product_id = $1)")
                .bind(id)
                .fetch_one(&mut **tx)
                .await?;
        Ok(ordered)
    }

    /// Take `quantity` units out of stock if at least that many remain.
    ///
    /// Returns the new stock level, or `None` when the product is missing or
    /// would go negative. The guard lives in the UPDATE itself so the check
    /// and the write cannot be separated by another transaction.
    pub async fn decrement_stock(&self, id: Uuid, quantity: i32) -> TransactionResult<Option<i32>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let stock = sqlx::query_scalar(
            "UPDATE products SET stock = stock - $2, updated_at = now()
             WHERE id = $1 AND stock >= $2
             RETURNING stock",
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(stock)
    }

    /// Return `quantity` units to stock. `None` when the product is missing.
    pub async fn increment_stock(&self, id: Uuid, quantity: i32) -> TransactionResult<Option<i32>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let stock = sqlx::query_scalar(
            "UPDATE products SET stock = stock + $2, updated_at = now()
             WHERE id = $1
             RETURNING stock",
        )
        .bind(id)
        .bind(quantity)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(stock)
    }
}

/// `ILIKE` pattern matching `search` anywhere, with its wildcards taken literally.
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
