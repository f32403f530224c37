use thiserror::Error;

use crate::{
    db_types::PaymentStatus,
    traits::{AccountError, CartError, CatalogError, GatewayError, OrderManagementError},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Session ID required for guest checkout")]
    MissingSession,
    #[error("Missing required fields: {0}")]
    MissingFields(String),
    #[error("Quantity must be at least 1")]
    InvalidQuantity,
    #[error("Product {0} not found")]
    ProductNotFound(i64),
    #[error("Insufficient stock for {title}. Available: {available}")]
    InsufficientStock { title: String, available: i64 },
    #[error("Amount must be at least ₦1")]
    AmountTooSmall,
    #[error("Order {0} not found")]
    OrderNotFound(i64),
    #[error("Reference mismatch")]
    ReferenceMismatch,
    #[error("Payment verification failed: transaction status is '{0}'")]
    PaymentNotSuccessful(String),
    #[error("Amount paid ({paid}) is less than the order total ({expected})")]
    AmountMismatch { paid: i64, expected: i64 },
    #[error("Not authorized")]
    NotAuthorized,
    #[error("Order not in hold status")]
    NotOnHold,
    #[error("Sellers already paid")]
    SellersAlreadyPaid,
    #[error("Order {id} cannot move from {from} to {to}")]
    IllegalTransition { id: i64, from: PaymentStatus, to: PaymentStatus },
    #[error("{0}")]
    Gateway(#[from] GatewayError),
}

impl From<OrderManagementError> for OrderFlowError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::DatabaseError(s) => Self::DatabaseError(s),
            OrderManagementError::OrderNotFound(id) => Self::OrderNotFound(id),
            OrderManagementError::IllegalTransition { id, from, to } => Self::IllegalTransition { id, from, to },
            OrderManagementError::SellersAlreadyPaid(_) => Self::SellersAlreadyPaid,
        }
    }
}

impl From<CatalogError> for OrderFlowError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::ProductNotFound(id) => Self::ProductNotFound(id),
            e => Self::DatabaseError(e.to_string()),
        }
    }
}

impl From<CartError> for OrderFlowError {
    fn from(e: CartError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

impl From<AccountError> for OrderFlowError {
    fn from(e: AccountError) -> Self {
        Self::DatabaseError(e.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum SellerApiError {
    #[error("{0}")]
    Account(#[from] AccountError),
    #[error("{0}")]
    Gateway(#[from] GatewayError),
    #[error("{0}")]
    InvalidInput(String),
}
