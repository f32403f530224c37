use thiserror::Error;

use crate::{
    db_types::{Cart, CartItem, CartOwner},
    traits::CatalogError,
};

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} not found")]
    ProductNotFound(i64),
    #[error("Insufficient stock for {title}. Available: {available}")]
    InsufficientStock { title: String, available: i64 },
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("Cart not found")]
    CartNotFound,
    #[error("Item not in cart")]
    ItemNotInCart(i64),
    #[error("User ID or session ID required")]
    MissingOwner,
    #[error("Invalid or empty items")]
    EmptyItems,
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CartManagement {
    async fn fetch_cart(&self, owner: &CartOwner) -> Result<Option<Cart>, CartError>;

    /// Replaces the cart's items, creating the cart if necessary. Saving an empty item list deletes the cart, in
    /// which case `None` is returned.
    async fn save_cart(&self, owner: &CartOwner, items: Vec<CartItem>) -> Result<Option<Cart>, CartError>;

    /// Deletes the cart. Returns `false` if there was nothing to delete.
    async fn delete_cart(&self, owner: &CartOwner) -> Result<bool, CartError>;
}

impl From<CatalogError> for CartError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(id) => CartError::ProductNotFound(id),
            e => CartError::DatabaseError(e.to_string()),
        }
    }
}
