use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::Category;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductOrdering {
    #[default]
    Newest,
    /// Most viewed first, ties broken by sales
    MostViewed,
    BestSelling,
}

/// Criteria for catalog queries. All set fields must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQueryFilter {
    pub seller_id: Option<i64>,
    pub category: Option<Category>,
    pub featured: Option<bool>,
    pub created_since: Option<DateTime<Utc>>,
    /// If both are set, a product matches when it meets either threshold
    pub min_views: Option<i64>,
    pub min_sales: Option<i64>,
    pub ordering: ProductOrdering,
    pub limit: Option<i64>,
}

impl ProductQueryFilter {
    pub fn with_seller_id(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_featured(mut self, featured: bool) -> Self {
        self.featured = Some(featured);
        self
    }

    pub fn with_created_since(mut self, since: DateTime<Utc>) -> Self {
        self.created_since = Some(since);
        self
    }

    pub fn with_min_views(mut self, views: i64) -> Self {
        self.min_views = Some(views);
        self
    }

    pub fn with_min_sales(mut self, sales: i64) -> Self {
        self.min_sales = Some(sales);
        self
    }

    pub fn with_ordering(mut self, ordering: ProductOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.seller_id.is_none()
            && self.category.is_none()
            && self.featured.is_none()
            && self.created_since.is_none()
            && self.min_views.is_none()
            && self.min_sales.is_none()
    }
}
