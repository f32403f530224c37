use chrono::{DateTime, Utc};
use mkt_common::Kobo;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every Paystack response is wrapped in this envelope. `data` is absent on most failures.
#[derive(Debug, Clone, Deserialize)]
pub struct PaystackResponse<T> {
    pub status: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

//--------------------------------------    Transactions     ---------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct InitializeTransaction {
    pub email: String,
    pub amount: Kobo,
    pub reference: String,
    pub callback_url: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionAuthorization {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Customer {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransactionVerification {
    pub id: Option<i64>,
    /// One of `success`, `failed`, `abandoned`, `ongoing`, `pending`, `processing`, `queued`, `reversed`.
    pub status: String,
    pub reference: String,
    pub amount: Kobo,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub gateway_response: Option<String>,
    #[serde(default)]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub customer: Option<Customer>,
}

impl TransactionVerification {
    pub fn is_successful(&self) -> bool {
        self.status == "success"
    }
}

//--------------------------------------       Banks         ---------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Bank {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolvedAccount {
    pub account_number: String,
    pub account_name: String,
}

//--------------------------------------      Transfers      ---------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct NewTransferRecipient {
    #[serde(rename = "type")]
    pub recipient_type: String,
    pub name: String,
    pub account_number: String,
    pub bank_code: String,
    pub currency: String,
}

impl NewTransferRecipient {
    /// A Nigerian bank account (NUBAN) recipient, paid in naira.
    pub fn nuban(name: &str, account_number: &str, bank_code: &str) -> Self {
        Self {
            recipient_type: "nuban".to_string(),
            name: name.to_string(),
            account_number: account_number.to_string(),
            bank_code: bank_code.to_string(),
            currency: mkt_common::NAIRA_CURRENCY_CODE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransferRecipient {
    pub recipient_code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTransfer {
    pub source: String,
    pub amount: Kobo,
    pub recipient: String,
    pub reason: String,
    pub reference: String,
}

impl NewTransfer {
    pub fn from_balance(amount: Kobo, recipient: &str, reason: &str, reference: &str) -> Self {
        Self {
            source: "balance".to_string(),
            amount,
            recipient: recipient.to_string(),
            reason: reason.to_string(),
            reference: reference.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Transfer {
    pub transfer_code: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    pub amount: Kobo,
}
