use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{NewOrder, Order, PaymentStatus};

#[derive(Debug, Clone, Error)]
pub enum OrderManagementError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Order {0} not found")]
    OrderNotFound(i64),
    #[error("Order {id} cannot move from {from} to {to}")]
    IllegalTransition { id: i64, from: PaymentStatus, to: PaymentStatus },
    #[error("Sellers already paid for order {0}")]
    SellersAlreadyPaid(i64),
}

impl From<sqlx::Error> for OrderManagementError {
    fn from(e: sqlx::Error) -> Self {
        OrderManagementError::DatabaseError(e.to_string())
    }
}

/// Order storage.
///
/// Status changes are conditional: each `mark_*` method only succeeds if the order is currently in the state the
/// transition starts from, and fails with [`OrderManagementError::IllegalTransition`] otherwise. Every returned
/// `Order` has its line items populated.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores the order and its line items in `pending` status.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderManagementError>;

    async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, OrderManagementError>;

    /// Records the gateway reference and checkout URL for a pending order.
    async fn set_payment_reference(
        &self,
        order_id: i64,
        reference: &str,
        authorization_url: &str,
    ) -> Result<Order, OrderManagementError>;

    /// `pending → hold`. In the same transaction, stock is reduced and sales counters are raised for every line item.
    async fn mark_order_on_hold(
        &self,
        order_id: i64,
        confirmed_at: DateTime<Utc>,
    ) -> Result<Order, OrderManagementError>;

    /// `pending → failed`
    async fn mark_order_failed(&self, order_id: i64) -> Result<Order, OrderManagementError>;

    /// Marks an order on hold as having payouts in progress. Returns false when the order cannot be claimed, i.e. it
    /// is not on hold, sellers were already paid, or another delivery confirmation holds the claim.
    async fn claim_payout(&self, order_id: i64, started_at: DateTime<Utc>) -> Result<bool, OrderManagementError>;

    /// Releases a payout claim after some transfers failed. Paid orders keep their claim.
    async fn release_payout(&self, order_id: i64) -> Result<(), OrderManagementError>;

    /// `hold → paid`. Fails with [`OrderManagementError::SellersAlreadyPaid`] if a payout was already recorded.
    async fn mark_order_paid(&self, order_id: i64, paid_at: DateTime<Utc>) -> Result<Order, OrderManagementError>;

    /// Newest first
    async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError>;

    /// Orders containing at least one of the seller's products, newest first.
    async fn fetch_orders_for_seller(
        &self,
        seller_id: i64,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Order>, OrderManagementError>;

    /// Pending orders that go through the gateway and were created before `cutoff`.
    async fn fetch_stale_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderManagementError>;
}
