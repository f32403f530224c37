use mkt_common::Kobo;
use serde::{Deserialize, Serialize};

use crate::{db_types::Order, order_objects::PayoutResult};

/// A new order was stored in `pending` status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// The order moved to `hold`: funds are captured (or will be collected on delivery).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentConfirmedEvent {
    pub order: Order,
}

impl PaymentConfirmedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Every seller on the order has been paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub payouts: Vec<PayoutResult>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, payouts: Vec<PayoutResult>) -> Self {
        Self { order, payouts }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFailedEvent {
    pub order: Order,
    pub reason: String,
}

impl OrderFailedEvent {
    pub fn new(order: Order, reason: impl Into<String>) -> Self {
        Self { order, reason: reason.into() }
    }
}

/// A single seller transfer failed during delivery confirmation. Nothing retries it automatically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutFailedEvent {
    pub order_id: i64,
    pub seller_id: i64,
    pub amount: Kobo,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    PaymentConfirmed(PaymentConfirmedEvent),
    OrderPaid(OrderPaidEvent),
    OrderFailed(OrderFailedEvent),
    PayoutFailed(PayoutFailedEvent),
}
