//! # Marketplace public API
//!
//! The API is modular. Each piece is created by supplying a backend that implements the storage traits it needs,
//! plus a [`PaymentGateway`](crate::traits::PaymentGateway) for the pieces that move money.
//!
//! * [`catalog_api`] manages products and the curated product listings.
//! * [`cart_api`] manages carts for users and guest sessions, keeping them consistent with live stock.
//! * [`order_flow_api`] runs checkout, payment verification, delivery confirmation and seller payouts.
//! * [`seller_api`] handles seller profiles, dashboards and payout setup.
//! * [`accounts_api`] registers buyers and sellers.
//!
//! ```rust,ignore
//! use marketplace_engine::{CatalogApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/marketplace.db", 5).await?;
//! let api = CatalogApi::new(db);
//! let trending = api.trending().await?;
//! ```
pub mod accounts_api;
pub mod cart_api;
pub mod cart_objects;
pub mod catalog_api;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod seller_api;
