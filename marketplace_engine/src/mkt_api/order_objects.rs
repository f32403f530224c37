use mkt_common::Kobo;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Order, PaymentMethod, Product, ShippingInfo},
    traits::GatewayMode,
};

/// A line item as the buyer's client saw it at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub product_id: i64,
    pub quantity: i64,
    /// The price displayed to the buyer. The live product price is what gets charged.
    pub price: Kobo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_info: ShippingInfo,
    pub items: Vec<CheckoutItem>,
    pub total_amount: Kobo,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Required for guests
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order: Order,
    pub payment_required: bool,
    pub authorization_url: Option<String>,
    pub reference: Option<String>,
    pub has_price_changes: bool,
}

impl CheckoutResult {
    pub fn message(&self) -> &'static str {
        match (self.payment_required, self.has_price_changes) {
            (false, _) => "Order created successfully (Pay on Delivery)",
            (true, true) => "Order created with updated prices",
            (true, false) => "Order created successfully",
        }
    }
}

/// Who is looking at an order. Decides which orders are visible and which line items are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderViewer {
    User(i64),
    Seller(i64),
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub product_id: i64,
    pub title: String,
    pub images: Vec<String>,
    pub price: Kobo,
}

impl From<Product> for ProductSummary {
    fn from(p: Product) -> Self {
        Self { product_id: p.id, title: p.title, images: p.images.0, price: p.price }
    }
}

/// An order along with the current catalog details of the products in it. Products that have since been deleted
/// are omitted from `products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub products: Vec<ProductSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutResult {
    pub seller_id: i64,
    pub success: bool,
    pub amount: Kobo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub mode: GatewayMode,
}

impl PayoutResult {
    pub fn success(seller_id: i64, amount: Kobo, transfer_code: String, mode: GatewayMode) -> Self {
        Self { seller_id, success: true, amount, transfer_code: Some(transfer_code), error: None, mode }
    }

    pub fn failure(seller_id: i64, amount: Kobo, error: String, mode: GatewayMode) -> Self {
        Self { seller_id, success: false, amount, transfer_code: None, error: Some(error), mode }
    }
}

/// The outcome of a delivery confirmation. The order is only `paid` if `all_successful` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfirmation {
    pub order: Order,
    pub payments: Vec<PayoutResult>,
    pub mode: GatewayMode,
    pub all_successful: bool,
}

impl DeliveryConfirmation {
    pub fn failed_count(&self) -> usize {
        self.payments.iter().filter(|p| !p.success).count()
    }

    pub fn message(&self) -> String {
        match (self.all_successful, self.mode) {
            (true, GatewayMode::Test) => "Order confirmed! (Test Mode - Payments Simulated)".to_string(),
            (true, GatewayMode::Live) => "Order confirmed and payments processed".to_string(),
            (false, _) => format!("{} payment(s) failed", self.failed_count()),
        }
    }
}
