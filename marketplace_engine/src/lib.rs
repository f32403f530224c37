//! Marketplace Engine
//!
//! The marketplace engine holds the business logic of a multi-vendor marketplace: the product catalog, buyer carts,
//! the order and payment lifecycle, and split payouts to sellers. It is agnostic of the web framework and of the
//! payment provider.
//!
//! The library is divided into three main sections:
//! 1. Storage ([`mod@traits`] and the SQLite backend). Backends implement the storage traits. You should not access
//!    the database directly; use the public API instead. The data types stored in the database live in
//!    [`mod@db_types`].
//! 2. The public API ([`CatalogApi`], [`CartApi`], [`OrderFlowApi`], [`SellerApi`] and [`AccountApi`]).
//! 3. Events. Payment state changes are published to subscribers through a small pub-sub system ([`mod@events`]).
//!
//! Payment providers plug in by implementing [`traits::PaymentGateway`].
pub mod db_types;
pub mod events;
pub mod helpers;
mod mkt_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::{db::run_migrations, SqliteDatabase};
pub use mkt_api::{
    accounts_api::AccountApi,
    cart_api::{reconcile_with_stock, CartApi},
    cart_objects,
    catalog_api::CatalogApi,
    errors::{OrderFlowError, SellerApiError},
    order_flow_api::OrderFlowApi,
    order_objects,
    seller_api::{PaymentSetupRequest, SellerApi},
};
pub use traits::{
    AccountManagement,
    CartManagement,
    CatalogManagement,
    MarketplaceDatabase,
    OrderManagement,
    PaymentGateway,
};
