use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{CustomerOrder, Order, OrderItem, OrderItemDetail, OrderStatus};
use crate::pagination::Page;
use crate::{Executor, TransactionError, TransactionResult};

const COLUMNS: &str =
    "id, user_id, total_amount, status, shipping_address, payment_method, created_at, updated_at";

pub struct OrderRepository {
    executor: Executor,
}

impl OrderRepository {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    /// Insert a new order in `pending` status.
    pub async fn insert(
        &self,
        user_id: Uuid,
        total_amount: Decimal,
        shipping_address: &str,
        payment_method: &str,
    ) -> TransactionResult<Order> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let order = sqlx::query_as::<_, Order>(&format!(
            "INSERT INTO orders (id, user_id, total_amount, status, shipping_address, payment_method)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(total_amount)
        .bind(OrderStatus::Pending)
        .bind(shipping_address)
        .bind(payment_method)
        .fetch_one(&mut **tx)
        .await?;
        Ok(order)
    }

    pub async fn insert_item(
        &self,
        order_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        price: Decimal,
    ) -> TransactionResult<OrderItem> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let item = sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items (id, order_id, product_id, quantity, price)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, order_id, product_id, quantity, price",
        )
        .bind(Uuid::new_v4())
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price)
        .fetch_one(&mut **tx)
        .await?;
        Ok(item)
    }

    pub async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> TransactionResult<Option<Order>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(order)
    }

    /// Read the order and hold its row lock until the transaction ends.
    ///
    /// With `owner` set, orders of other users are treated as absent.
    pub async fn lock(&self, id: Uuid, owner: Option<Uuid>) -> TransactionResult<Option<Order>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {COLUMNS} FROM orders
             WHERE id = $1 AND ($2::uuid IS NULL OR user_id = $2)
             FOR UPDATE"
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(order)
    }

    pub async fn items(&self, order_id: Uuid) -> TransactionResult<Vec<OrderItem>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, quantity, price FROM order_items
             WHERE order_id = $1
             ORDER BY product_id",
        )
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(items)
    }

    pub async fn item_details(&self, order_id: Uuid) -> TransactionResult<Vec<OrderItemDetail>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let items = sqlx::query_as::<_, OrderItemDetail>(
            "SELECT oi.id, oi.product_id, p.name AS product_name, oi.quantity, oi.price
             FROM order_items oi
             JOIN products p ON p.id = oi.product_id
             WHERE oi.order_id = $1
             ORDER BY p.name, oi.id",
        )
        .bind(order_id)
        .fetch_all(&mut **tx)
        .await?;
        Ok(items)
    }

    pub async fn set_status(&self, id: Uuid, status: OrderStatus) -> TransactionResult<Option<Order>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let order = sqlx::query_as::<_, Order>(&format!(
            "UPDATE orders SET status = $2, updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&mut **tx)
        .await?;
        Ok(order)
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<OrderStatus>,
        page: Page,
    ) -> TransactionResult<Vec<Order>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {COLUMNS} FROM orders
             WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2)
             ORDER BY created_at DESC, id
             OFFSET $3 LIMIT $4"
        ))
        .bind(user_id)
        .bind(status)
        .bind(page.offset())
        .bind(page.limit)
        .fetch_all(&mut **tx)
        .await?;
        Ok(orders)
    }

    pub async fn count_for_user(&self, user_id: Uuid, status: Option<OrderStatus>) -> TransactionResult<i64> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders
             WHERE user_id = $1 AND ($2::order_status IS NULL OR status = $2)",
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&mut **tx)
        .await?;
        Ok(total)
    }

    pub async fn list_all(&self, status: Option<OrderStatus>, page: Page) -> TransactionResult<Vec<CustomerOrder>> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let orders = sqlx::query_as::<_, CustomerOrder>(
            "SELECT o.id, o.user_id, o.total_amount, o.status, o.shipping_address, o.payment_method,
                    o.created_at, o.updated_at,
                    u.name AS customer_name, u.email AS customer_email
             FROM orders o
             JOIN users u ON u.id = o.user_id
             WHERE ($1::order_status IS NULL OR o.status = $1)
             ORDER BY o.created_at DESC, o.id
             OFFSET $2 LIMIT $3",
        )
        .bind(status)
        .bind(page.offset())
        .bind(page.limit)
        .fetch_all(&mut **tx)
        .await?;
        Ok(orders)
    }

    pub async fn count_all(&self, status: Option<OrderStatus>) -> TransactionResult<i64> {
        let mut tx_guard = self.executor.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::SessionClosed)?;
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE ($1::order_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&mut **tx)
        .await?;
        Ok(total)
    }
}
