//! Repositories bound to one unit of work.
//!
//! Each repository wraps a clone of the session's [`Executor`](crate::Executor),
//! so everything issued through repositories built from the same session
//! commits or rolls back as one.

mod cart;
mod order;
mod product;
mod user;

pub use cart::CartRepository;
pub use order::OrderRepository;
pub use product::ProductRepository;
pub use user::UserRepository;
