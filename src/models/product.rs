use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{require_text, Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
}

impl NewProduct {
    pub fn validated(self) -> Result<Self> {
        let name = require_text("name", &self.name)?;
        check_price(self.price)?;
        check_stock(self.stock)?;
        Ok(Self { name, ..self })
    }
}

/// Partial product edit; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
}

impl ProductUpdate {
    pub fn validated(self) -> Result<Self> {
        let name = self
            .name
            .as_deref()
            .map(|name| require_text("name", name))
            .transpose()?;
        if let Some(price) = self.price {
            check_price(price)?;
        }
        if let Some(stock) = self.stock {
            check_stock(stock)?;
        }
        Ok(Self { name, ..self })
    }
}

/// Largest value a `NUMERIC(12,2)` money column holds.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

fn check_price(price: Decimal) -> Result<()> {
    if price.is_sign_negative() {
        return Err(Error::Validation("price must not be negative".into()));
    }
    if price.normalize().scale() > 2 {
        return Err(Error::Validation("price must have at most two decimal places".into()));
    }
    if price > MAX_AMOUNT {
        return Err(Error::Validation(format!("price must not exceed {MAX_AMOUNT}")));
    }
    Ok(())
}

fn check_stock(stock: i32) -> Result<()> {
    if stock < 0 {
        return Err(Error::Validation("stock must not be negative".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(price: Decimal, stock: i32) -> NewProduct {
        NewProduct {
            name: " Widget ".into(),
            description: String::new(),
            price,
            stock,
        }
    }

    #[test]
    fn new_product_is_trimmed() {
        let product = widget(Decimal::new(1000, 2), 3).validated().unwrap();
        assert_eq!(product.name, "Widget");
    }

    #[test]
    fn negative_price_and_stock_are_rejected() {
        assert!(widget(Decimal::new(-1, 2), 1).validated().is_err());
        assert!(widget(Decimal::ZERO, -1).validated().is_err());
    }

    #[test]
    fn price_must_fit_the_money_column() {
        assert_eq!(MAX_AMOUNT.to_string(), "9999999999.99");
        assert!(widget(MAX_AMOUNT, 1).validated().is_ok());

        let err = widget(Decimal::new(10_000_000_000_000, 2), 1).validated().unwrap_err();
        assert!(matches!(err, Error::Validation(message) if message.contains("9999999999.99")));
        assert!(widget(Decimal::new(1_005, 3), 1).validated().is_err());
        assert!(widget(Decimal::new(1_500, 3), 1).validated().is_ok());
    }

    #[test]
    fn update_only_checks_present_fields() {
        let update = ProductUpdate {
            stock: Some(0),
            ..Default::default()
        };
        assert!(update.validated().is_ok());

        let blank = ProductUpdate {
            name: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank.validated().is_err());
    }
}
