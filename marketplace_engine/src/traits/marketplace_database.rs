use crate::traits::{AccountManagement, CartManagement, CatalogManagement, OrderManagement};

/// The full set of storage behaviour a backend must provide to run a marketplace.
#[allow(async_fn_in_trait)]
pub trait MarketplaceDatabase:
    Clone + CatalogManagement + CartManagement + OrderManagement + AccountManagement
{
    /// The URL of the database
    fn url(&self) -> &str;

    async fn close(&mut self) -> Result<(), sqlx::Error> {
        Ok(())
    }
}
