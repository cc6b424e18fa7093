//! Order lifecycle: placement, cancellation, administrative status changes
//! and the read-only order projections.

mod events;
mod service;

pub use events::{LogEventSink, OrderEvent, OrderEventSink};
pub use service::{OrderQuery, OrderService};
