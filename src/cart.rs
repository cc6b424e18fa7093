//! Per-user cart: lazy creation, line-item edits and clearing.
//!
//! Stock checks here only give the shopper early feedback; the order
//! placement transaction re-validates stock before anything is decremented.

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{check_quantity, AddCartItem, CartItem, CartView};
use crate::repositories::{CartRepository, ProductRepository};
use crate::{settle, PostgresUnitOfWork, UnitOfWork, UnitOfWorkSession};

pub struct CartService<U = PostgresUnitOfWork> {
    uow: U,
}

impl<U: UnitOfWork> CartService<U> {
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    /// The user's cart with its items, created on first access.
    pub async fn view(&self, user_id: Uuid) -> Result<CartView> {
        let session = self.uow.begin().await?;
        let carts = CartRepository::new(session.executor().clone());
        let outcome = async {
            let cart = carts.find_or_create_for_user(user_id).await?;
            let items = carts.lines(cart.id).await?;
            Ok::<_, Error>(CartView { cart, items })
        }
        .await;
        settle(session, outcome).await
    }

    #[instrument(skip(self, request), fields(%user_id, product_id = %request.product_id))]
    pub async fn add_item(&self, user_id: Uuid, request: AddCartItem) -> Result<CartItem> {
        check_quantity(request.quantity)?;

        let session = self.uow.begin().await?;
        let carts = CartRepository::new(session.executor().clone());
        let products = ProductRepository::new(session.executor().clone());
        let outcome = async {
            let product = products
                .find_by_id(request.product_id)
                .await?
                .ok_or(Error::NotFound("Product"))?;
            let cart = carts.find_or_create_for_user(user_id).await?;
            let in_cart = carts
                .find_item_by_product(cart.id, product.id)
                .await?
                .map_or(0, |item| item.quantity);
            if product.stock < in_cart.saturating_add(request.quantity) {
                warn!(stock = product.stock, in_cart, "Not enough stock to add to cart");
                return Err(Error::InsufficientStock {
                    product_id: product.id,
                });
            }
            Ok::<_, Error>(carts.add_item(cart.id, product.id, request.quantity).await?)
        }
        .await;

        let item = settle(session, outcome).await?;
        info!(item_id = %item.id, quantity = item.quantity, "Cart item saved");
        Ok(item)
    }

    pub async fn update_item(&self, user_id: Uuid, item_id: Uuid, quantity: i32) -> Result<CartItem> {
        check_quantity(quantity)?;

        let session = self.uow.begin().await?;
        let carts = CartRepository::new(session.executor().clone());
        let products = ProductRepository::new(session.executor().clone());
        let outcome = async {
            let cart = carts
                .find_for_user(user_id)
                .await?
                .ok_or(Error::NotFound("Cart"))?;
            let item = carts
                .find_item(cart.id, item_id)
                .await?
                .ok_or(Error::NotFound("Cart item"))?;
            let product = products
                .find_by_id(item.product_id)
                .await?
                .ok_or(Error::NotFound("Product"))?;
            if product.stock < quantity {
                return Err(Error::InsufficientStock {
                    product_id: product.id,
                });
            }
            carts
                .set_quantity(cart.id, item.id, quantity)
                .await?
                .ok_or(Error::NotFound("Cart item"))
        }
        .await;
        settle(session, outcome).await
    }

    pub async fn remove_item(&self, user_id: Uuid, item_id: Uuid) -> Result<()> {
        let session = self.uow.begin().await?;
        let carts = CartRepository::new(session.executor().clone());
        let outcome = async {
            let cart = carts
                .find_for_user(user_id)
                .await?
                .ok_or(Error::NotFound("Cart"))?;
            if !carts.remove_item(cart.id, item_id).await? {
                return Err(Error::NotFound("Cart item"));
            }
            Ok::<_, Error>(())
        }
        .await;
        settle(session, outcome).await
    }

    /// Remove every item; returns how many lines were dropped.
    pub async fn clear(&self, user_id: Uuid) -> Result<u64> {
        let session = self.uow.begin().await?;
        let carts = CartRepository::new(session.executor().clone());
        let outcome = async {
            match carts.find_for_user(user_id).await? {
                Some(cart) => Ok::<_, Error>(carts.clear(cart.id).await?),
                None => Ok(0),
            }
        }
        .await;
        settle(session, outcome).await
    }
}
