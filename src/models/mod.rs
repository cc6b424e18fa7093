//! Row types and request payloads.

mod cart;
mod order;
mod product;
mod user;

pub(crate) use cart::check_quantity;
pub use cart::{AddCartItem, Cart, CartItem, CartLine, CartView, UpdateCartItem};
pub use order::{CustomerOrder, Order, OrderDetail, OrderItem, OrderItemDetail, OrderStatus, PlaceOrder};
pub use product::{NewProduct, Product, ProductUpdate, MAX_AMOUNT};
pub use user::{NewUser, Role, User};
