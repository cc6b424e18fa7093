use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{Error, Result};

/// One cart per user, created on first access and never deleted.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
}

/// A cart item joined with the product it references, as currently stored.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub price: Decimal,
    pub stock: i32,
    pub quantity: i32,
}

impl CartLine {
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    #[serde(flatten)]
    pub cart: Cart,
    pub items: Vec<CartLine>,
}

impl CartView {
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartLine::subtotal).sum()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddCartItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartItem {
    pub quantity: i32,
}

pub(crate) fn check_quantity(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(Error::Validation("quantity must be at least 1".into()));
    }
    Ok(())
}
