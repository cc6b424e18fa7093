//! Product catalog: public browsing and admin maintenance.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{NewProduct, Product, ProductUpdate};
use crate::pagination::{Page, Paginated};
use crate::repositories::{CartRepository, ProductRepository};
use crate::{settle, PostgresUnitOfWork, UnitOfWork, UnitOfWorkSession};

pub struct CatalogService<U = PostgresUnitOfWork> {
    uow: U,
}

impl<U: UnitOfWork> CatalogService<U> {
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    /// Page through products, optionally filtered by a case-insensitive name match.
    pub async fn list(&self, search: Option<&str>, page: Page) -> Result<Paginated<Product>> {
        let search = search.map(str::trim).filter(|term| !term.is_empty());

        let session = self.uow.begin().await?;
        let products = ProductRepository::new(session.executor().clone());
        let outcome = async {
            let items = products.list(search, page).await?;
            let total = products.count(search).await?;
            Ok::<_, Error>(Paginated {
                items,
                meta: page.meta(total),
            })
        }
        .await;
        settle(session, outcome).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Product> {
        let session = self.uow.begin().await?;
        let outcome = ProductRepository::new(session.executor().clone())
            .find_by_id(id)
            .await
            .map_err(Error::from)
            .and_then(|product| product.ok_or(Error::NotFound("Product")));
        settle(session, outcome).await
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: NewProduct) -> Result<Product> {
        let product = product.validated()?;

        let session = self.uow.begin().await?;
        let outcome = ProductRepository::new(session.executor().clone())
            .create(&product)
            .await
            .map_err(Error::from);
        let created = settle(session, outcome).await?;
        info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub async fn update(&self, id: Uuid, update: ProductUpdate) -> Result<Product> {
        let update = update.validated()?;

        let session = self.uow.begin().await?;
        let outcome = ProductRepository::new(session.executor().clone())
            .update(id, &update)
            .await
            .map_err(Error::from)
            .and_then(|product| product.ok_or(Error::NotFound("Product")));
        settle(session, outcome).await
    }

    /// Delete a product that no order has ever referenced.
    ///
    /// Its cart lines go with it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let session = self.uow.begin().await?;
        let carts = CartRepository::new(session.executor().clone());
        let products = ProductRepository::new(session.executor().clone());
        let outcome = async {
            // Cart lines before the product row, the same order checkout takes them.
            let in_carts = carts.lock_lines_of_product(id).await?;
            if products.lock_by_id(id).await?.is_none() {
                return Err(Error::NotFound("Product"));
            }
            // Under the row lock any checkout of this product has already finished.
            if products.is_ordered(id).await? {
                return Err(Error::Conflict(
                    "Product is referenced by existing orders".into(),
                ));
            }
            if !products.delete(id).await? {
                return Err(Error::NotFound("Product"));
            }
            Ok::<_, Error>(in_carts.len())
        }
        .await;
        let removed_from_carts = settle(session, outcome).await?;
        info!(removed_from_carts, "Product deleted");
        Ok(())
    }
}
