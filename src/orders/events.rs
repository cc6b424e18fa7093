//! Order domain events, published only once their transaction has committed.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::OrderStatus;
use crate::{TransactionAware, TransactionResult};

#[derive(Debug, Clone, PartialEq)]
pub enum OrderEvent {
    Placed {
        order_id: Uuid,
        user_id: Uuid,
        total_amount: Decimal,
        line_count: usize,
    },
    Cancelled {
        order_id: Uuid,
        previous: OrderStatus,
        restocked_units: i64,
    },
    StatusChanged {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },
}

/// Destination for committed order events.
pub trait OrderEventSink: Send + Sync {
    fn publish(&self, event: OrderEvent);
}

/// Default sink: one structured log line per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl OrderEventSink for LogEventSink {
    fn publish(&self, event: OrderEvent) {
        match event {
            OrderEvent::Placed {
                order_id,
                user_id,
                total_amount,
                line_count,
            } => tracing::info!(
                %order_id,
                %user_id,
                total_amount = %total_amount,
                line_count,
                "Order placed"
            ),
            OrderEvent::Cancelled {
                order_id,
                previous,
                restocked_units,
            } => tracing::info!(%order_id, %previous, restocked_units, "Order cancelled"),
            OrderEvent::StatusChanged { order_id, from, to } => {
                tracing::info!(%order_id, %from, %to, "Order status changed")
            }
        }
    }
}

/// Events raised inside one unit of work, held back until it finishes.
pub(crate) struct PendingEvents {
    sink: Arc<dyn OrderEventSink>,
    buffer: Mutex<Vec<OrderEvent>>,
}

impl PendingEvents {
    pub(crate) fn new(sink: Arc<dyn OrderEventSink>) -> Arc<Self> {
        Arc::new(Self {
            sink,
            buffer: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn record(&self, event: OrderEvent) {
        self.buffer.lock().push(event);
    }

    fn drain(&self) -> Vec<OrderEvent> {
        std::mem::take(&mut *self.buffer.lock())
    }
}

#[async_trait]
impl TransactionAware for PendingEvents {
    async fn on_commit(&self) -> TransactionResult<()> {
        for event in self.drain() {
            self.sink.publish(event);
        }
        Ok(())
    }

    async fn on_rollback(&self) -> TransactionResult<()> {
        let discarded = self.drain().len();
        if discarded > 0 {
            tracing::debug!(discarded, "Dropped order events of rolled back transaction");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collect(Mutex<Vec<OrderEvent>>);

    impl OrderEventSink for Collect {
        fn publish(&self, event: OrderEvent) {
            self.0.lock().push(event);
        }
    }

    fn status_change() -> OrderEvent {
        OrderEvent::StatusChanged {
            order_id: Uuid::new_v4(),
            from: OrderStatus::Pending,
            to: OrderStatus::Processing,
        }
    }

    #[tokio::test]
    async fn commit_publishes_buffered_events() {
        let sink = Arc::new(Collect::default());
        let pending = PendingEvents::new(sink.clone());
        let event = status_change();
        pending.record(event.clone());

        assert!(sink.0.lock().is_empty());
        pending.on_commit().await.unwrap();
        assert_eq!(*sink.0.lock(), vec![event]);
    }

    #[tokio::test]
    async fn rollback_discards_buffered_events() {
        let sink = Arc::new(Collect::default());
        let pending = PendingEvents::new(sink.clone());
        pending.record(status_change());

        pending.on_rollback().await.unwrap();
        pending.on_commit().await.unwrap();
        assert!(sink.0.lock().is_empty());
    }
}
