//! Product management and the curated catalog listings.
use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::{Category, NewProduct, Product, ProductUpdate},
    traits::{CatalogError, CatalogManagement, ProductOrdering, ProductQueryFilter},
};

/// How far back "trending" and "hot" look
pub const TRENDING_WINDOW_DAYS: i64 = 7;
pub const TRENDING_MIN_VIEWS: i64 = 50;
pub const HOT_MIN_SALES: i64 = 10;
const SHOWCASE_LIMIT: i64 = 10;
const CATEGORY_LIMIT: i64 = 20;

pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, CatalogError> {
        validate_new_product(&product)?;
        let product = self.db.insert_product(seller_id, product).await?;
        info!("🛍️ Seller #{seller_id} listed product #{} ({})", product.id, product.title);
        Ok(product)
    }

    pub async fn update_product(
        &self,
        seller_id: i64,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        validate_update(&update)?;
        let product = self
            .db
            .update_product(seller_id, product_id, update)
            .await?
            .ok_or(CatalogError::ProductNotFound(product_id))?;
        debug!("🛍️ Seller #{seller_id} updated product #{product_id}");
        Ok(product)
    }

    pub async fn delete_product(&self, seller_id: i64, product_id: i64) -> Result<(), CatalogError> {
        if self.db.delete_product(seller_id, product_id).await? {
            info!("🛍️ Seller #{seller_id} deleted product #{product_id}");
            Ok(())
        } else {
            Err(CatalogError::ProductNotFound(product_id))
        }
    }

    /// Fetches a product for display, counting the view.
    pub async fn product_by_id(&self, product_id: i64) -> Result<Product, CatalogError> {
        let mut product = self.db.fetch_product(product_id).await?.ok_or(CatalogError::ProductNotFound(product_id))?;
        self.db.increment_product_views(product_id).await?;
        product.views += 1;
        Ok(product)
    }

    pub async fn all_products(&self, category: Option<Category>) -> Result<Vec<Product>, CatalogError> {
        let mut filter = ProductQueryFilter::default();
        filter.category = category;
        self.db.fetch_products(filter).await
    }

    /// Recent products that are drawing attention: at least 50 views or 10 sales in the last week.
    pub async fn trending(&self) -> Result<Vec<Product>, CatalogError> {
        let filter = ProductQueryFilter::default()
            .with_created_since(Utc::now() - Duration::days(TRENDING_WINDOW_DAYS))
            .with_min_views(TRENDING_MIN_VIEWS)
            .with_min_sales(HOT_MIN_SALES)
            .with_ordering(ProductOrdering::MostViewed)
            .with_limit(SHOWCASE_LIMIT);
        self.db.fetch_products(filter).await
    }

    /// Recent best sellers
    pub async fn hot(&self) -> Result<Vec<Product>, CatalogError> {
        let filter = ProductQueryFilter::default()
            .with_created_since(Utc::now() - Duration::days(TRENDING_WINDOW_DAYS))
            .with_min_sales(HOT_MIN_SALES)
            .with_ordering(ProductOrdering::BestSelling)
            .with_limit(SHOWCASE_LIMIT);
        self.db.fetch_products(filter).await
    }

    pub async fn featured(&self) -> Result<Vec<Product>, CatalogError> {
        let filter = ProductQueryFilter::default().with_featured(true).with_limit(SHOWCASE_LIMIT);
        self.db.fetch_products(filter).await
    }

    pub async fn by_category(&self, category: Category) -> Result<Vec<Product>, CatalogError> {
        let filter = ProductQueryFilter::default().with_category(category).with_limit(CATEGORY_LIMIT);
        self.db.fetch_products(filter).await
    }

    /// Only shown to signed-in shoppers.
    pub async fn special_offers(&self, authenticated: bool) -> Result<Vec<Product>, CatalogError> {
        if !authenticated {
            return Err(CatalogError::AuthenticationRequired);
        }
        let filter = ProductQueryFilter::default().with_limit(SHOWCASE_LIMIT);
        self.db.fetch_products(filter).await
    }

    pub async fn style_inspiration(&self) -> Result<Vec<Product>, CatalogError> {
        let filter = ProductQueryFilter::default().with_featured(true).with_limit(SHOWCASE_LIMIT);
        self.db.fetch_products(filter).await
    }

    pub async fn seller_products(
        &self,
        seller_id: i64,
        category: Option<Category>,
    ) -> Result<Vec<Product>, CatalogError> {
        let mut filter = ProductQueryFilter::default().with_seller_id(seller_id);
        filter.category = category;
        self.db.fetch_products(filter).await
    }
}

fn validate_new_product(product: &NewProduct) -> Result<(), CatalogError> {
    if product.title.trim().is_empty() {
        return Err(CatalogError::InvalidProduct("Title is required".into()));
    }
    if product.description.trim().is_empty() {
        return Err(CatalogError::InvalidProduct("Description is required".into()));
    }
    if product.price.is_negative() {
        return Err(CatalogError::InvalidProduct("Price cannot be negative".into()));
    }
    if product.stock < 0 {
        return Err(CatalogError::InvalidProduct("Stock cannot be negative".into()));
    }
    Ok(())
}

fn validate_update(update: &ProductUpdate) -> Result<(), CatalogError> {
    if update.is_empty() {
        return Err(CatalogError::InvalidProduct("Nothing to update".into()));
    }
    if update.title.as_ref().is_some_and(|t| t.trim().is_empty()) {
        return Err(CatalogError::InvalidProduct("Title cannot be blank".into()));
    }
    if update.price.is_some_and(|p| p.is_negative()) {
        return Err(CatalogError::InvalidProduct("Price cannot be negative".into()));
    }
    if update.stock.is_some_and(|s| s < 0) {
        return Err(CatalogError::InvalidProduct("Stock cannot be negative".into()));
    }
    Ok(())
}
