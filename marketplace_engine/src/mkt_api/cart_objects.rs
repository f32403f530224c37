use mkt_common::Kobo;
use serde::{Deserialize, Serialize};

use crate::db_types::{Cart, Category, Product};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: i64,
    pub quantity: i64,
    /// Price when the item was added
    pub price: Kobo,
    pub title: String,
    pub images: Vec<String>,
    pub category: Category,
    pub seller_id: i64,
    pub stock: i64,
}

impl CartLine {
    pub fn new(product: &Product, quantity: i64, price: Kobo) -> Self {
        Self {
            product_id: product.id,
            quantity,
            price,
            title: product.title.clone(),
            images: product.images.0.clone(),
            category: product.category,
            seller_id: product.seller_id,
            stock: product.stock,
        }
    }
}

/// A cart joined with catalog data, as returned to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total: Kobo,
}

impl CartView {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn from_lines(items: Vec<CartLine>) -> Self {
        let total = items.iter().map(|l| l.price * l.quantity).sum();
        Self { items, total }
    }
}

/// The result of any cart operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartResult {
    pub cart: CartView,
    /// Guests must send this back on subsequent requests
    pub session_id: Option<String>,
    /// True if any quantities were reduced, or items dropped, to match stock
    pub adjusted: bool,
    pub has_price_changes: bool,
}

impl CartResult {
    pub fn new(cart: CartView, session_id: Option<String>) -> Self {
        Self { cart, session_id, adjusted: false, has_price_changes: false }
    }

    pub fn with_adjusted(mut self, adjusted: bool) -> Self {
        self.adjusted = adjusted;
        self
    }

    pub fn with_price_changes(mut self, changed: bool) -> Self {
        self.has_price_changes = changed;
        self
    }
}

/// An item in a cart sync request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItem {
    pub product_id: i64,
    pub quantity: i64,
    pub price: Kobo,
}

/// Stored carts only reference products; this pairs them for display.
pub(crate) fn cart_lines(cart: &Cart, products: &[Product]) -> Vec<CartLine> {
    cart.items
        .iter()
        .filter_map(|item| {
            products.iter().find(|p| p.id == item.product_id).map(|p| CartLine::new(p, item.quantity, item.price))
        })
        .collect()
}
