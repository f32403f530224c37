//! # Marketplace server
//! This crate hosts the REST API for the marketplace. It is responsible for:
//! * Serving the product catalog, buyer carts and seller dashboards.
//! * Creating orders and handing buyers off to Paystack to pay.
//! * Receiving Paystack's signed webhook notifications, and the buyer's manual payment checks.
//! * Paying sellers their share once the buyer confirms delivery.
//!
//! The business logic lives in `marketplace_engine`; this crate wires it to HTTP, to access tokens and to Paystack.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! `/health` answers liveness checks. Everything else lives under `/api`; see [routes](routes/index.html),
//! [seller_routes](seller_routes/index.html) and [paystack_routes](paystack_routes/index.html).
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod helpers;
pub mod integrations;
pub mod middleware;
pub mod paystack_routes;
pub mod routes;
pub mod seller_routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
