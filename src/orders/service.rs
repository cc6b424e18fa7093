use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::events::{LogEventSink, OrderEvent, OrderEventSink, PendingEvents};
use crate::error::{require_text, Error, Result};
use crate::models::{CartLine, CustomerOrder, Order, OrderDetail, OrderStatus, PlaceOrder, MAX_AMOUNT};
use crate::pagination::{Page, Paginated};
use crate::repositories::{CartRepository, OrderRepository, ProductRepository};
use crate::{settle, Executor, PostgresUnitOfWork, UnitOfWork, UnitOfWorkSession};

/// Listing filter: page window plus optional status.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderQuery {
    pub page: Page,
    pub status: Option<OrderStatus>,
}

impl OrderQuery {
    /// Build from raw query parameters; a blank status means no filter.
    pub fn from_params(page: Option<i64>, limit: Option<i64>, status: Option<&str>) -> Result<Self> {
        let status = match status.map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(value.parse()?),
        };
        Ok(Self {
            page: Page::new(page, limit),
            status,
        })
    }
}

pub struct OrderService<U = PostgresUnitOfWork> {
    uow: U,
    events: Arc<dyn OrderEventSink>,
}

impl<U: UnitOfWork> OrderService<U> {
    pub fn new(uow: U) -> Self {
        Self::with_event_sink(uow, Arc::new(LogEventSink))
    }

    pub fn with_event_sink(uow: U, events: Arc<dyn OrderEventSink>) -> Self {
        Self { uow, events }
    }

    fn track_events(&self, session: &U::Session) -> Arc<PendingEvents> {
        let pending = PendingEvents::new(self.events.clone());
        session.register_transaction_aware(pending.clone());
        pending
    }

    /// Turn the user's cart into a pending order.
    ///
    /// The cart is first read outside any write transaction to reject empty
    /// or obviously oversized carts early. That read is advisory: inside the
    /// transaction every cart line and product row is locked and re-read, and
    /// only those values decide stock sufficiency, captured prices and the
    /// total. Either the order, its items, every stock decrement and the cart
    /// clearing all commit, or none of them do.
    #[instrument(skip(self, request), fields(%user_id))]
    pub async fn place_order(&self, user_id: Uuid, request: PlaceOrder) -> Result<Order> {
        let shipping_address = require_text("shipping_address", &request.shipping_address)?;
        let payment_method = require_text("payment_method", &request.payment_method)?;

        let session = self.uow.begin().await?;
        let outcome = CartRepository::new(session.executor().clone())
            .load_with_items(user_id)
            .await
            .map_err(Error::from);
        let snapshot = settle(session, outcome).await?;

        let (cart, lines) = match snapshot {
            Some(view) if !view.items.is_empty() => (view.cart, view.items),
            _ => return Err(Error::EmptyCart),
        };
        if let Some(line) = lines.iter().find(|line| line.stock < line.quantity) {
            warn!(product_id = %line.product_id, "Cart exceeds available stock");
            return Err(Error::InsufficientStock {
                product_id: line.product_id,
            });
        }
        let quoted = total_of(lines.iter().map(|line| (line.price, line.quantity)));

        let session = self.uow.begin().await?;
        let events = self.track_events(&session);
        let outcome = place_in(
            session.executor(),
            &events,
            user_id,
            cart.id,
            &shipping_address,
            &payment_method,
        )
        .await;
        let order = settle(session, outcome).await.inspect_err(|err| {
            warn!(error = %err, "Order placement rolled back");
        })?;

        if order.total_amount != quoted {
            info!(
                order_id = %order.id,
                quoted = %quoted,
                charged = %order.total_amount,
                "Prices changed between cart read and checkout"
            );
        }
        Ok(order)
    }

    /// Cancel one of the caller's own orders and put its items back in stock.
    #[instrument(skip(self), fields(%user_id, %order_id))]
    pub async fn cancel_order(&self, user_id: Uuid, order_id: Uuid) -> Result<Order> {
        let session = self.uow.begin().await?;
        let events = self.track_events(&session);
        let outcome = cancel_in(session.executor(), &events, order_id, user_id).await;
        settle(session, outcome).await.inspect_err(|err| {
            warn!(error = %err, "Order cancellation rolled back");
        })
    }

    /// Administrative status overwrite.
    ///
    /// Moving a pending or processing order to `cancelled` goes through the
    /// same stock restoration as a customer cancellation. Reopening a
    /// cancelled order, or cancelling one that already shipped, is refused so
    /// stock is never restored twice or for goods that left the warehouse.
    #[instrument(skip(self), fields(%order_id))]
    pub async fn update_status(&self, order_id: Uuid, status: &str) -> Result<Order> {
        let target: OrderStatus = status.trim().parse()?;

        let session = self.uow.begin().await?;
        let events = self.track_events(&session);
        let outcome = transition_in(session.executor(), &events, order_id, target).await;
        settle(session, outcome).await
    }

    pub async fn list_orders(&self, user_id: Uuid, query: OrderQuery) -> Result<Paginated<Order>> {
        let session = self.uow.begin().await?;
        let orders = OrderRepository::new(session.executor().clone());
        let outcome = async {
            let items = orders.list_for_user(user_id, query.status, query.page).await?;
            let total = orders.count_for_user(user_id, query.status).await?;
            Ok::<_, Error>(Paginated {
                items,
                meta: query.page.meta(total),
            })
        }
        .await;
        settle(session, outcome).await
    }

    pub async fn list_all_orders(&self, query: OrderQuery) -> Result<Paginated<CustomerOrder>> {
        let session = self.uow.begin().await?;
        let orders = OrderRepository::new(session.executor().clone());
        let outcome = async {
            let items = orders.list_all(query.status, query.page).await?;
            let total = orders.count_all(query.status).await?;
            Ok::<_, Error>(Paginated {
                items,
                meta: query.page.meta(total),
            })
        }
        .await;
        settle(session, outcome).await
    }

    pub async fn order_detail(&self, user_id: Uuid, order_id: Uuid) -> Result<OrderDetail> {
        let session = self.uow.begin().await?;
        let orders = OrderRepository::new(session.executor().clone());
        let outcome = async {
            let order = orders
                .find_for_user(order_id, user_id)
                .await?
                .ok_or(Error::NotFound("Order"))?;
            let items = orders.item_details(order.id).await?;
            Ok::<_, Error>(OrderDetail { order, items })
        }
        .await;
        settle(session, outcome).await
    }
}

fn total_of(lines: impl Iterator<Item = (Decimal, i32)>) -> Decimal {
    lines.map(|(price, quantity)| price * Decimal::from(quantity)).sum()
}

async fn place_in(
    executor: &Executor,
    events: &PendingEvents,
    user_id: Uuid,
    cart_id: Uuid,
    shipping_address: &str,
    payment_method: &str,
) -> Result<Order> {
    let carts = CartRepository::new(executor.clone());
    let products = ProductRepository::new(executor.clone());
    let orders = OrderRepository::new(executor.clone());

    // Lines come back ordered by product id, so product locks below are
    // always taken in the same order and concurrent checkouts cannot deadlock.
    let lines = carts.lock_lines(cart_id).await?;
    if lines.is_empty() {
        return Err(Error::EmptyCart);
    }

    let mut priced: Vec<(&CartLine, Decimal)> = Vec::with_capacity(lines.len());
    for line in &lines {
        let product = products
            .lock_by_id(line.product_id)
            .await?
            .ok_or(Error::NotFound("Product"))?;
        if product.stock < line.quantity {
            return Err(Error::InsufficientStock {
                product_id: product.id,
            });
        }
        priced.push((line, product.price));
    }

    let total_amount = total_of(priced.iter().map(|(line, price)| (*price, line.quantity)));
    if total_amount > MAX_AMOUNT {
        return Err(Error::Validation(format!("order total must not exceed {MAX_AMOUNT}")));
    }
    let order = orders
        .insert(user_id, total_amount, shipping_address, payment_method)
        .await?;

    for (line, price) in &priced {
        orders
            .insert_item(order.id, line.product_id, line.quantity, *price)
            .await?;
        products
            .decrement_stock(line.product_id, line.quantity)
            .await?
            .ok_or(Error::InsufficientStock {
                product_id: line.product_id,
            })?;
    }

    let ordered: Vec<Uuid> = lines.iter().map(|line| line.id).collect();
    carts.remove_items(cart_id, &ordered).await?;

    events.record(OrderEvent::Placed {
        order_id: order.id,
        user_id,
        total_amount,
        line_count: lines.len(),
    });
    Ok(order)
}

async fn cancel_in(executor: &Executor, events: &PendingEvents, order_id: Uuid, user_id: Uuid) -> Result<Order> {
    let order = OrderRepository::new(executor.clone())
        .lock(order_id, Some(user_id))
        .await?
        .ok_or(Error::NotFound("Order"))?;
    if !order.status.is_cancellable() {
        return Err(Error::OrderNotCancellable);
    }
    restock_and_cancel(executor, events, order).await
}

async fn transition_in(
    executor: &Executor,
    events: &PendingEvents,
    order_id: Uuid,
    target: OrderStatus,
) -> Result<Order> {
    let orders = OrderRepository::new(executor.clone());
    let order = orders
        .lock(order_id, None)
        .await?
        .ok_or(Error::NotFound("Order"))?;

    match (order.status, target) {
        (from, to) if from == to => Ok(order),
        (OrderStatus::Cancelled, to) => Err(Error::InvalidTransition {
            from: OrderStatus::Cancelled,
            to,
        }),
        (from, OrderStatus::Cancelled) if from.is_cancellable() => {
            restock_and_cancel(executor, events, order).await
        }
        (from, OrderStatus::Cancelled) => Err(Error::InvalidTransition {
            from,
            to: OrderStatus::Cancelled,
        }),
        (from, to) => {
            let updated = orders
                .set_status(order.id, to)
                .await?
                .ok_or(Error::NotFound("Order"))?;
            events.record(OrderEvent::StatusChanged {
                order_id: order.id,
                from,
                to,
            });
            Ok(updated)
        }
    }
}

/// Caller must hold the order's row lock and have checked it is cancellable.
async fn restock_and_cancel(executor: &Executor, events: &PendingEvents, order: Order) -> Result<Order> {
    let orders = OrderRepository::new(executor.clone());
    let products = ProductRepository::new(executor.clone());

    let mut restocked_units = 0i64;
    for item in orders.items(order.id).await? {
        products
            .increment_stock(item.product_id, item.quantity)
            .await?
            .ok_or(Error::NotFound("Product"))?;
        restocked_units += i64::from(item.quantity);
    }

    let cancelled = orders
        .set_status(order.id, OrderStatus::Cancelled)
        .await?
        .ok_or(Error::NotFound("Order"))?;
    events.record(OrderEvent::Cancelled {
        order_id: order.id,
        previous: order.status,
        restocked_units,
    });
    Ok(cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_without_status_has_no_filter() {
        let query = OrderQuery::from_params(None, None, None).unwrap();
        assert_eq!(query.status, None);
        assert_eq!(query.page, Page::default());

        let blank = OrderQuery::from_params(Some(2), Some(5), Some("  ")).unwrap();
        assert_eq!(blank.status, None);
        assert_eq!(blank.page.offset(), 5);
    }

    #[test]
    fn query_status_must_be_known() {
        let query = OrderQuery::from_params(None, None, Some("shipped")).unwrap();
        assert_eq!(query.status, Some(OrderStatus::Shipped));
        assert!(matches!(
            OrderQuery::from_params(None, None, Some("lost")),
            Err(Error::InvalidStatus(_))
        ));
    }

    #[test]
    fn total_multiplies_price_by_quantity() {
        let total = total_of(
            [(Decimal::new(1000, 2), 2), (Decimal::new(2000, 2), 1)].into_iter(),
        );
        assert_eq!(total, Decimal::new(4000, 2));
    }
}
