//! `SqliteDatabase` is the SQLite implementation of the marketplace storage traits.
//!
//! Anything that touches more than one row set (orders with their line items, carts with their items, a status
//! change along with its stock effects) runs inside a single transaction.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{accounts, carts, db_url, new_pool, orders, products};
use crate::{
    db_types::{
        Cart,
        CartItem,
        CartOwner,
        NewOrder,
        NewProduct,
        NewSeller,
        NewUser,
        Order,
        PaymentStatus,
        PayoutDetails,
        Product,
        ProductUpdate,
        Seller,
        SellerProfileUpdate,
        SellerStats,
        User,
    },
    traits::{
        AccountError,
        AccountManagement,
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        MarketplaceDatabase,
        OrderManagement,
        OrderManagementError,
        ProductQueryFilter,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Connects to the database named by `MKT_DATABASE_URL`, or the default location.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        info!("🗃️ Database connection pool closed");
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::insert_product(seller_id, product, &mut conn).await?;
        debug!("🗃️ Product #{} saved for seller #{seller_id}", product.id);
        Ok(product)
    }

    async fn update_product(
        &self,
        seller_id: i64,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::update_product(seller_id, product_id, update, &mut conn).await?)
    }

    async fn delete_product(&self, seller_id: i64, product_id: i64) -> Result<bool, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::delete_product(seller_id, product_id, &mut conn).await?)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::fetch_product(product_id, &mut conn).await?)
    }

    async fn fetch_products(&self, filter: ProductQueryFilter) -> Result<Vec<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::search_products(filter, &mut conn).await?)
    }

    async fn increment_product_views(&self, product_id: i64) -> Result<(), CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(products::increment_views(product_id, &mut conn).await?)
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart(&self, owner: &CartOwner) -> Result<Option<Cart>, CartError> {
        let mut conn = self.pool.acquire().await?;
        carts::fetch_cart(owner, &mut conn).await
    }

    async fn save_cart(&self, owner: &CartOwner, items: Vec<CartItem>) -> Result<Option<Cart>, CartError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::save_cart(owner, items, &mut tx).await?;
        tx.commit().await?;
        Ok(cart)
    }

    async fn delete_cart(&self, owner: &CartOwner) -> Result<bool, CartError> {
        let mut tx = self.pool.begin().await?;
        let deleted = carts::delete_cart(owner, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_reference(reference, &mut conn).await?)
    }

    async fn set_payment_reference(
        &self,
        order_id: i64,
        reference: &str,
        authorization_url: &str,
    ) -> Result<Order, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        orders::set_payment_reference(order_id, reference, authorization_url, &mut conn).await
    }

    async fn mark_order_on_hold(
        &self,
        order_id: i64,
        confirmed_at: DateTime<Utc>,
    ) -> Result<Order, OrderManagementError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::update_status(
            order_id,
            PaymentStatus::Pending,
            PaymentStatus::Hold,
            Some(("payment_confirmed_at", confirmed_at)),
            &mut tx,
        )
        .await?;
        for item in &order.items {
            products::record_sale(item.product_id, item.quantity, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Stock updated for the {} line item(s) of order #{order_id}", order.items.len());
        Ok(order)
    }

    async fn mark_order_failed(&self, order_id: i64) -> Result<Order, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_status(order_id, PaymentStatus::Pending, PaymentStatus::Failed, None, &mut conn).await
    }

    async fn claim_payout(&self, order_id: i64, started_at: DateTime<Utc>) -> Result<bool, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::claim_payout(order_id, started_at, &mut conn).await?)
    }

    async fn release_payout(&self, order_id: i64) -> Result<(), OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::release_payout(order_id, &mut conn).await?)
    }

    async fn mark_order_paid(&self, order_id: i64, paid_at: DateTime<Utc>) -> Result<Order, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        orders::update_status(
            order_id,
            PaymentStatus::Hold,
            PaymentStatus::Paid,
            Some(("seller_paid_at", paid_at)),
            &mut conn,
        )
        .await
    }

    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_user(user_id, &mut conn).await?)
    }

    async fn fetch_orders_for_seller(
        &self,
        seller_id: i64,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_seller(seller_id, status, &mut conn).await?)
    }

    async fn fetch_stale_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderManagementError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_stale_pending_orders(cutoff, &mut conn).await?)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, AccountError> {
        let mut conn = self.pool.acquire().await?;
        accounts::insert_user(user, &mut conn).await
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountError> {
        let mut conn = self.pool.acquire().await?;
        Ok(accounts::fetch_user(user_id, &mut conn).await?)
    }

    async fn insert_seller(&self, seller: NewSeller) -> Result<Seller, AccountError> {
        let mut conn = self.pool.acquire().await?;
        accounts::insert_seller(seller, &mut conn).await
    }

    async fn fetch_seller(&self, seller_id: i64) -> Result<Option<Seller>, AccountError> {
        let mut conn = self.pool.acquire().await?;
        Ok(accounts::fetch_seller(seller_id, &mut conn).await?)
    }

    async fn fetch_seller_by_email(&self, email: &str) -> Result<Option<Seller>, AccountError> {
        let mut conn = self.pool.acquire().await?;
        Ok(accounts::fetch_seller_by_email(email, &mut conn).await?)
    }

    async fn update_seller_profile(
        &self,
        seller_id: i64,
        update: SellerProfileUpdate,
    ) -> Result<Option<Seller>, AccountError> {
        let mut conn = self.pool.acquire().await?;
        accounts::update_seller_profile(seller_id, update, &mut conn).await
    }

    async fn set_seller_payout_details(&self, seller_id: i64, details: PayoutDetails) -> Result<Seller, AccountError> {
        let mut conn = self.pool.acquire().await?;
        accounts::set_payout_details(seller_id, details, &mut conn).await
    }

    async fn fetch_seller_stats(&self, seller_id: i64) -> Result<SellerStats, AccountError> {
        let mut conn = self.pool.acquire().await?;
        Ok(accounts::fetch_seller_stats(seller_id, &mut conn).await?)
    }
}
