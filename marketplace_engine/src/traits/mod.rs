//! # Storage and payment provider contracts
//!
//! This module defines the behaviour that backends need to expose in order to drive the marketplace engine.
//!
//! * [`CatalogManagement`] stores products and answers catalog queries.
//! * [`CartManagement`] stores carts for users and guest sessions.
//! * [`OrderManagement`] stores orders and applies payment status transitions atomically.
//! * [`AccountManagement`] stores buyer and seller profiles, and seller payout details.
//! * [`MarketplaceDatabase`] ties the above together for a single backend.
//!
//! [`PaymentGateway`] is the seam to the payment provider. The engine never talks to a provider directly.
mod account_management;
mod cart_management;
mod catalog_management;
mod data_objects;
mod marketplace_database;
mod order_management;
mod payment_gateway;

pub use account_management::{AccountError, AccountManagement};
pub use cart_management::{CartError, CartManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use data_objects::{ProductOrdering, ProductQueryFilter};
pub use marketplace_database::MarketplaceDatabase;
pub use order_management::{OrderManagement, OrderManagementError};
pub use payment_gateway::{
    BankInfo,
    ChargeAuthorization,
    ChargeRequest,
    ChargeVerification,
    GatewayError,
    GatewayMode,
    PaymentGateway,
    RecipientRequest,
    ResolvedAccount,
    TransferReceipt,
    TransferRequest,
};
