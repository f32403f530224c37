use std::{
    collections::BTreeMap,
    fmt::Display,
    str::FromStr,
};

use chrono::{DateTime, Utc};
pub use mkt_common::Kobo;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Role         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A buyer with an account
    User,
    /// A store owner who lists products and receives payouts
    Seller,
    /// Marketplace staff. Admins can confirm delivery on behalf of buyers.
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Seller => write!(f, "seller"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "seller" => Ok(Self::Seller),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------      Category       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Category {
    #[sqlx(rename = "clothing")]
    Clothing,
    #[sqlx(rename = "footwear")]
    Footwear,
    #[sqlx(rename = "bags & accessories")]
    BagsAndAccessories,
    #[sqlx(rename = "undergarments")]
    Undergarments,
    #[sqlx(rename = "kids & baby fashion")]
    KidsAndBabyFashion,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Clothing,
        Category::Footwear,
        Category::BagsAndAccessories,
        Category::Undergarments,
        Category::KidsAndBabyFashion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Clothing => "clothing",
            Category::Footwear => "footwear",
            Category::BagsAndAccessories => "bags & accessories",
            Category::Undergarments => "undergarments",
            Category::KidsAndBabyFashion => "kids & baby fashion",
        }
    }

    /// URL-friendly form, e.g. `bags-accessories`
    pub fn slug(&self) -> &'static str {
        match self {
            Category::Clothing => "clothing",
            Category::Footwear => "footwear",
            Category::BagsAndAccessories => "bags-accessories",
            Category::Undergarments => "undergarments",
            Category::KidsAndBabyFashion => "kids-baby-fashion",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s || c.slug() == s)
            .ok_or_else(|| ConversionError(format!("Invalid category: {s}")))
    }
}

impl TryFrom<String> for Category {
    type Error = ConversionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
/// The payment status of an order.
///
/// | From      | To       | When                                                              |
/// |-----------|----------|-------------------------------------------------------------------|
/// | `Pending` | `Hold`   | The gateway confirmed the charge, or the buyer pays on delivery   |
/// | `Pending` | `Failed` | The charge could not be initialized, was declined, or expired     |
/// | `Hold`    | `Paid`   | Delivery was confirmed and every seller payout succeeded          |
///
/// No other transitions are possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// The order has been created and is awaiting payment
    Pending,
    /// Funds are captured, but not yet released to sellers
    Hold,
    /// Sellers have been paid out
    Paid,
    /// Payment failed or was abandoned
    Failed,
}

impl PaymentStatus {
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!((self, next), (Pending, Hold) | (Pending, Failed) | (Hold, Paid))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Hold => "hold",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "hold" => Ok(Self::Hold),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    BankTransfer,
    PayOnDelivery,
}

impl PaymentMethod {
    /// Whether the buyer pays through the payment gateway at checkout
    pub fn requires_gateway(&self) -> bool {
        !matches!(self, PaymentMethod::PayOnDelivery)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            PaymentMethod::PayOnDelivery => write!(f, "pay_on_delivery"),
        }
    }
}

//--------------------------------------      CartOwner      ---------------------------------------------------------
/// Carts and orders belong either to a registered user or to an anonymous guest session, never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CartOwner {
    User(i64),
    Guest(String),
}

impl CartOwner {
    pub fn user_id(&self) -> Option<i64> {
        match self {
            CartOwner::User(id) => Some(*id),
            CartOwner::Guest(_) => None,
        }
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            CartOwner::User(_) => None,
            CartOwner::Guest(s) => Some(s.as_str()),
        }
    }

    /// Reconstructs the owner from the pair of nullable columns used in storage. User ownership takes precedence.
    pub fn from_columns(user_id: Option<i64>, session_id: Option<String>) -> Option<Self> {
        match (user_id, session_id) {
            (Some(id), _) => Some(CartOwner::User(id)),
            (None, Some(s)) if !s.is_empty() => Some(CartOwner::Guest(s)),
            _ => None,
        }
    }
}

impl Display for CartOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartOwner::User(id) => write!(f, "user #{id}"),
            CartOwner::Guest(s) => write!(f, "guest session {s}"),
        }
    }
}

//--------------------------------------       Product       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub title: String,
    pub description: String,
    pub price: Kobo,
    pub stock: i64,
    pub category: Category,
    pub images: Json<Vec<String>>,
    pub views: i64,
    pub sales: i64,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub description: String,
    pub price: Kobo,
    pub stock: i64,
    pub category: Category,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
}

impl NewProduct {
    pub fn new(title: &str, price: Kobo, stock: i64, category: Category) -> Self {
        Self {
            title: title.to_string(),
            description: title.to_string(),
            price,
            stock,
            category,
            images: vec![],
            is_featured: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Kobo>,
    pub stock: Option<i64>,
    pub category: Option<Category>,
    pub images: Option<Vec<String>>,
    pub is_featured: Option<bool>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.category.is_none()
            && self.images.is_none()
            && self.is_featured.is_none()
    }

    pub fn with_price(mut self, price: Kobo) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_stock(mut self, stock: i64) -> Self {
        self.stock = Some(stock);
        self
    }
}

//--------------------------------------        Cart         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: i64,
    pub quantity: i64,
    /// The product price at the moment it was added
    pub price: Kobo,
}

impl CartItem {
    pub fn new(product_id: i64, quantity: i64, price: Kobo) -> Self {
        Self { product_id, quantity, price }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub owner: CartOwner,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn item(&self, product_id: i64) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }
}

//--------------------------------------    ShippingInfo     ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl ShippingInfo {
    /// The names of required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
        .collect()
    }
}

//--------------------------------------      OrderItem      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub seller_id: i64,
    pub quantity: i64,
    /// Snapshot of the product price when the order was placed
    pub unit_price: Kobo,
}

impl OrderItem {
    pub fn line_total(&self) -> Kobo {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub seller_id: i64,
    pub quantity: i64,
    pub unit_price: Kobo,
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub user_id: Option<i64>,
    pub session_id: Option<String>,
    #[sqlx(flatten)]
    pub shipping_info: ShippingInfo,
    pub total_amount: Kobo,
    pub payment_status: PaymentStatus,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub authorization_url: Option<String>,
    pub payment_confirmed_at: Option<DateTime<Utc>>,
    pub seller_paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn owner(&self) -> Option<CartOwner> {
        CartOwner::from_columns(self.user_id, self.session_id.clone())
    }

    pub fn is_owned_by_user(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id)
    }

    pub fn has_items_from_seller(&self, seller_id: i64) -> bool {
        self.items.iter().any(|i| i.seller_id == seller_id)
    }

    /// Revenue owed to each seller in this order. Keyed by seller id, so iteration order is deterministic.
    pub fn seller_totals(&self) -> BTreeMap<i64, Kobo> {
        let mut totals = BTreeMap::new();
        for item in &self.items {
            *totals.entry(item.seller_id).or_insert_with(Kobo::default) += item.line_total();
        }
        totals
    }

    /// A copy of this order that only contains the given seller's line items.
    pub fn filtered_for_seller(&self, seller_id: i64) -> Self {
        let mut order = self.clone();
        order.items.retain(|i| i.seller_id == seller_id);
        order
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub owner: CartOwner,
    pub shipping_info: ShippingInfo,
    pub items: Vec<NewOrderItem>,
    pub total_amount: Kobo,
    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    pub fn new(
        owner: CartOwner,
        shipping_info: ShippingInfo,
        items: Vec<NewOrderItem>,
        payment_method: PaymentMethod,
    ) -> Self {
        let total_amount = items.iter().map(|i| i.unit_price * i.quantity).sum();
        Self { owner, shipping_info, items, total_amount, payment_method, created_at: Utc::now() }
    }
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
}

//--------------------------------------       Seller        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Seller {
    pub id: i64,
    pub store_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub categories: Json<Vec<String>>,
    pub description: Option<String>,
    pub recipient_code: Option<String>,
    pub bank_code: Option<String>,
    /// Only the last four digits are kept
    pub account_number: Option<String>,
    pub account_name: Option<String>,
    pub bank_name: Option<String>,
    pub is_payment_setup: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Seller {
    pub fn can_receive_payouts(&self) -> bool {
        self.recipient_code.as_ref().map(|c| !c.is_empty()).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSeller {
    pub store_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SellerProfileUpdate {
    pub store_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub categories: Option<Vec<String>>,
    pub description: Option<String>,
}

/// Bank details stored against a seller once payouts are configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutDetails {
    pub recipient_code: String,
    pub bank_code: String,
    pub masked_account_number: String,
    pub account_name: String,
    pub bank_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerStats {
    pub total_products: i64,
    pub total_orders: i64,
    /// Orders on hold, awaiting delivery confirmation
    pub pending_orders: i64,
    pub completed_orders: i64,
    /// The seller's share of paid orders
    pub total_revenue: Kobo,
    /// The seller's share of orders on hold
    pub pending_revenue: Kobo,
}
