use std::fmt::Display;

use marketplace_engine::{
    cart_objects::SyncItem,
    db_types::{Category, PaymentStatus},
    order_objects::{CheckoutResult, DeliveryConfirmation, OrderDetails},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// `?category=` accepts either the category name or its slug.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<Category>,
}

/// Guests identify their cart with a session id, sent in the body or query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionQuery {
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartItemRequest {
    #[serde(alias = "productId")]
    pub product_id: i64,
    pub quantity: i64,
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncCartRequest {
    pub items: Vec<SyncItem>,
    #[serde(default, alias = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyPaymentParams {
    pub reference: String,
    #[serde(rename = "orderId")]
    pub order_id: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyAccountRequest {
    #[serde(alias = "accountNumber")]
    pub account_number: String,
    #[serde(alias = "bankCode")]
    pub bank_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub message: String,
    #[serde(flatten)]
    pub result: CheckoutResult,
}

impl From<CheckoutResult> for CheckoutResponse {
    fn from(result: CheckoutResult) -> Self {
        Self { message: result.message().to_string(), result }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedPaymentResponse {
    pub message: String,
    #[serde(flatten)]
    pub details: OrderDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResponse {
    pub message: String,
    #[serde(flatten)]
    pub confirmation: DeliveryConfirmation,
}

impl From<DeliveryConfirmation> for DeliveryResponse {
    fn from(confirmation: DeliveryConfirmation) -> Self {
        Self { message: confirmation.message(), confirmation }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub message: String,
}

impl WebhookResponse {
    pub fn new<S: Display>(message: S) -> Self {
        Self { message: message.to_string() }
    }
}
