use thiserror::Error;

use crate::{
    db_types::{NewProduct, Product, ProductUpdate},
    traits::ProductQueryFilter,
};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} not found")]
    ProductNotFound(i64),
    #[error("Invalid product: {0}")]
    InvalidProduct(String),
    #[error("You must be logged in to see this content")]
    AuthenticationRequired,
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// Product storage.
///
/// Mutating methods take the seller id so that backends can enforce ownership in the same statement. A product owned
/// by someone else is indistinguishable from a missing one.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, CatalogError>;

    /// Applies the non-empty fields of `update`. Returns `None` if the seller does not own a product with this id.
    async fn update_product(
        &self,
        seller_id: i64,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Option<Product>, CatalogError>;

    /// Returns `false` if the seller does not own a product with this id.
    async fn delete_product(&self, seller_id: i64, product_id: i64) -> Result<bool, CatalogError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;

    async fn fetch_products(&self, filter: ProductQueryFilter) -> Result<Vec<Product>, CatalogError>;

    async fn increment_product_views(&self, product_id: i64) -> Result<(), CatalogError>;
}
