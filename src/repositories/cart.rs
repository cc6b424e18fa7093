use uuid::Uuid;

use crate::models::{Cart, CartItem, CartLine, CartView};
use crate::{Executor, TransactionError, TransactionResult};

const LINE_QUERY: &str = "SELECT ci.id, ci.product_id, p.name AS product_name, p.price, p.stock, ci.quantity
     FROM cart_items ci
     JOIN products p ON p.id = ci.product_id
     WHERE ci.cart_id = $1
     ORDER BY ci.product_id";

pub struct CartRepository {
    executor: Executor,
}

impl CartRepository {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub async fn find_for_user(&self, user_id: Uuid) -> TransactionResult<Option<Cart>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(cart)
    }

    /// Fetch the user's cart, creating it on first access.
    ///
    /// The no-op `DO UPDATE` makes the insert return the existing row when a
    /// concurrent request created the cart first.
    pub async fn find_or_create_for_user(&self, user_id: Uuid) -> TransactionResult<Cart> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let cart = sqlx::query_as::<_, Cart>(
            "INSERT INTO carts (id, user_id) VALUES ($1, $2)
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
             RETURNING id, user_id, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(cart)
    }

    /// The user's cart with every item and its current product data, or
    /// `None` if the user never had a cart.
    pub async fn load_with_items(&self, user_id: Uuid) -> TransactionResult<Option<CartView>> {
        let Some(cart) = self.find_for_user(user_id).await? else {
            return Ok(None);
        };
        let items = self.lines(cart.id).await?;
        Ok(Some(CartView { cart, items }))
    }

    /// Items of the cart with their current product data, ordered by product id.
    pub async fn lines(&self, cart_id: Uuid) -> TransactionResult<Vec<CartLine>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let lines = sqlx::query_as::<_, CartLine>(LINE_QUERY)
            .bind(cart_id)
            .fetch_all(&mut **tx)
            .await?;
        Ok(lines)
    }

    /// Like [`lines`](Self::lines) but locks the cart item rows, so a
    /// concurrent checkout or cart edit for the same cart waits for this
    /// transaction to finish.
    pub async fn lock_lines(&self, cart_id: Uuid) -> TransactionResult<Vec<CartLine>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let lines = sqlx::query_as::<_, CartLine>(&format!("{LINE_QUERY} FOR UPDATE OF ci"))
            .bind(cart_id)
            .fetch_all(&mut **tx)
            .await?;
        Ok(lines)
    }

    /// Lock every cart line, in any cart, that holds `product_id`.
    pub async fn lock_lines_of_product(&self, product_id: Uuid) -> TransactionResult<Vec<Uuid>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let ids = sqlx::query_scalar(
            "SELECT id FROM cart_items WHERE product_id = $1 ORDER BY cart_id FOR UPDATE",
        )
        .bind(product_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(ids)
    }

    pub async fn find_item(&self, cart_id: Uuid, item_id: Uuid) -> TransactionResult<Option<CartItem>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let item = sqlx::query_as::<_, CartItem>(
            "SELECT id, cart_id, product_id, quantity FROM cart_items
             WHERE id = $1 AND cart_id = $2",
        )
        .bind(item_id)
        .bind(cart_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(item)
    }

    pub async fn find_item_by_product(
        &self,
        cart_id: Uuid,
        product_id: Uuid,
    ) -> TransactionResult<Option<CartItem>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let item = sqlx::query_as::<_, CartItem>(
            "SELECT id, cart_id, product_id, quantity FROM cart_items
             WHERE cart_id = $1 AND product_id = $2",
        )
        .bind(cart_id)
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(item)
    }

    /// Add `quantity` of a product; an existing line for the product grows
    /// instead of being duplicated.
    pub async fn add_item(&self, cart_id: Uuid, product_id: Uuid, quantity: i32) -> TransactionResult<CartItem> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let item = sqlx::query_as::<_, CartItem>(
            "INSERT INTO cart_items (id, cart_id, product_id, quantity) VALUES ($1, $2, $3, $4)
             ON CONFLICT (cart_id, product_id)
             DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
             RETURNING id, cart_id, product_id, quantity",
        )
        .bind(Uuid::new_v4())
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&mut **tx)
        .await?;
        Ok(item)
    }

    pub async fn set_quantity(
        &self,
        cart_id: Uuid,
        item_id: Uuid,
        quantity: i32,
    ) -> TransactionResult<Option<CartItem>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let item = sqlx::query_as::<_, CartItem>(
            "UPDATE cart_items SET quantity = $3
             WHERE id = $1 AND cart_id = $2
             RETURNING id, cart_id, product_id, quantity",
        )
        .bind(item_id)
        .bind(cart_id)
        .bind(quantity)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(item)
    }

    pub async fn remove_item(&self, cart_id: Uuid, item_id: Uuid) -> TransactionResult<bool> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id)
            .bind(cart_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the given items of the cart; returns how many were removed.
    pub async fn remove_items(&self, cart_id: Uuid, item_ids: &[Uuid]) -> TransactionResult<u64> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND id = ANY($2)")
            .bind(cart_id)
            .bind(item_ids)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn clear(&self, cart_id: Uuid) -> TransactionResult<u64> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }
}
