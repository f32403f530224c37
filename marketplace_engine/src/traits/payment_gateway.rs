use std::fmt::Display;

use mkt_common::Kobo;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Payment gateway is unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Rejected(String),
    #[error("Payment gateway is busy. Please try again later.")]
    RateLimited,
}

/// Whether the gateway moves real money. Reported back to sellers and buyers alongside payout results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayMode {
    Test,
    Live,
}

impl Display for GatewayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatewayMode::Test => write!(f, "test"),
            GatewayMode::Live => write!(f, "live"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub order_id: i64,
    pub email: String,
    pub amount: Kobo,
    pub reference: String,
    pub callback_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeAuthorization {
    pub reference: String,
    pub authorization_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeVerification {
    pub reference: String,
    pub status: String,
    pub amount: Kobo,
}

impl ChargeVerification {
    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }

    /// The buyer will not complete this charge; the order can be failed.
    pub fn is_definitive_failure(&self) -> bool {
        matches!(self.status.as_str(), "failed" | "abandoned")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub order_id: i64,
    pub seller_id: i64,
    pub recipient_code: String,
    pub amount: Kobo,
    pub reason: String,
    pub reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub transfer_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankInfo {
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAccount {
    pub account_number: String,
    pub account_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipientRequest {
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
}

/// The payment provider. Implementations are responsible for any test-mode simulation; the engine treats every
/// response as authoritative.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    fn mode(&self) -> GatewayMode;

    /// Starts a hosted checkout for the buyer.
    async fn initialize_charge(&self, request: ChargeRequest) -> Result<ChargeAuthorization, GatewayError>;

    async fn verify_charge(&self, reference: &str) -> Result<ChargeVerification, GatewayError>;

    /// Sends funds from the marketplace balance to a seller's recipient.
    async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, GatewayError>;

    async fn list_banks(&self) -> Result<Vec<BankInfo>, GatewayError>;

    async fn resolve_account(&self, account_number: &str, bank_code: &str) -> Result<ResolvedAccount, GatewayError>;

    /// Registers a bank account as a transfer destination, returning its recipient code.
    async fn create_recipient(&self, request: RecipientRequest) -> Result<String, GatewayError>;
}
