//! Adapts [`PaystackApi`] to the engine's [`PaymentGateway`].
//!
//! In test mode, money never moves to sellers: account lookups answer from a fixed table, recipients get a
//! placeholder code and transfers are simulated. Charges still go to Paystack, whose test keys accept test cards.
use chrono::Utc;
use log::*;
use marketplace_engine::traits::{
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
use mkt_common::NAIRA_CURRENCY_CODE;
use paystack_tools::{
    data_objects::{InitializeTransaction, NewTransfer, NewTransferRecipient},
    PaystackApi,
    PaystackApiError,
};
use serde_json::json;

use crate::config::GatewayConfig;

pub const TEST_RECIPIENT_CODE: &str = "TEST_RECIPIENT_CODE";
pub const TEST_ACCOUNT_NAME: &str = "TEST ACCOUNT NAME";

/// (account number, bank code, account name)
const TEST_ACCOUNTS: [(&str, &str, &str); 3] = [
    ("0000000000", "044", "Test Account"),
    ("1111111111", "058", "Test Account Two"),
    ("2222222222", "232", "Test Account Three"),
];

/// Offered to sellers in test mode when Paystack cannot list banks.
const MOCK_BANKS: [(&str, &str); 7] = [
    ("044", "Access Bank"),
    ("058", "GTBank"),
    ("232", "Sterling Bank"),
    ("033", "United Bank for Africa"),
    ("215", "Unity Bank"),
    ("035", "Wema Bank"),
    ("057", "Zenith Bank"),
];

#[derive(Clone)]
pub struct PaystackGateway {
    api: PaystackApi,
    test_mode: bool,
}

impl PaystackGateway {
    pub fn new(config: &GatewayConfig) -> Result<Self, PaystackApiError> {
        let api = PaystackApi::new(config.api.clone())?;
        if config.test_mode {
            warn!("💳️ Paystack gateway is in TEST mode. Seller payouts will be simulated.");
        }
        Ok(Self { api, test_mode: config.test_mode })
    }

    fn simulated_transfer_code(request: &TransferRequest) -> String {
        format!("test_transfer_{}_{}_{}", request.order_id, request.seller_id, Utc::now().timestamp_millis())
    }
}

pub fn test_account(account_number: &str, bank_code: &str) -> ResolvedAccount {
    let account_name = TEST_ACCOUNTS
        .iter()
        .find(|(acc, bank, _)| *acc == account_number && *bank == bank_code)
        .map(|(_, _, name)| *name)
        .unwrap_or(TEST_ACCOUNT_NAME);
    ResolvedAccount { account_number: account_number.to_string(), account_name: account_name.to_string() }
}

pub fn mock_banks() -> Vec<BankInfo> {
    MOCK_BANKS.iter().map(|(code, name)| BankInfo { code: code.to_string(), name: name.to_string() }).collect()
}

fn to_gateway_error(e: PaystackApiError) -> GatewayError {
    match e {
        PaystackApiError::RateLimited => GatewayError::RateLimited,
        PaystackApiError::Rejected(msg) => GatewayError::Rejected(msg),
        PaystackApiError::QueryError { status, message } if (400..500).contains(&status) => {
            GatewayError::Rejected(message)
        },
        e => GatewayError::Unavailable(e.to_string()),
    }
}

impl PaymentGateway for PaystackGateway {
    fn mode(&self) -> GatewayMode {
        if self.test_mode {
            GatewayMode::Test
        } else {
            GatewayMode::Live
        }
    }

    async fn initialize_charge(&self, request: ChargeRequest) -> Result<ChargeAuthorization, GatewayError> {
        let tx = InitializeTransaction {
            email: request.email,
            amount: request.amount,
            reference: request.reference,
            callback_url: request.callback_url,
            metadata: json!({ "order_id": request.order_id }),
        };
        let auth = self.api.initialize_transaction(&tx).await.map_err(to_gateway_error)?;
        Ok(ChargeAuthorization { reference: auth.reference, authorization_url: auth.authorization_url })
    }

    async fn verify_charge(&self, reference: &str) -> Result<ChargeVerification, GatewayError> {
        let tx = self.api.verify_transaction(reference).await.map_err(to_gateway_error)?;
        Ok(ChargeVerification { reference: tx.reference, status: tx.status, amount: tx.amount })
    }

    async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, GatewayError> {
        if self.test_mode {
            let transfer_code = Self::simulated_transfer_code(&request);
            info!("💳️ Simulated transfer of {} to seller #{}: {transfer_code}", request.amount, request.seller_id);
            return Ok(TransferReceipt { transfer_code });
        }
        let transfer =
            NewTransfer::from_balance(request.amount, &request.recipient_code, &request.reason, &request.reference);
        match self.api.initiate_transfer(&transfer).await {
            Ok(t) => Ok(TransferReceipt { transfer_code: t.transfer_code }),
            // Paystack refuses transfers from accounts that are still in test mode
            Err(e) if e.gateway_message().map(|m| m.contains("Test mode")).unwrap_or(false) => {
                warn!("💳️ Paystack account is in test mode. Simulating transfer for order {}", request.order_id);
                Ok(TransferReceipt { transfer_code: Self::simulated_transfer_code(&request) })
            },
            Err(e) => {
                error!("💳️ Transfer to seller #{} failed. {e}", request.seller_id);
                Err(to_gateway_error(e))
            },
        }
    }

    async fn list_banks(&self) -> Result<Vec<BankInfo>, GatewayError> {
        match self.api.list_banks("nigeria", NAIRA_CURRENCY_CODE).await {
            Ok(banks) => Ok(banks.into_iter().map(|b| BankInfo { code: b.code, name: b.name }).collect()),
            Err(e) if self.test_mode => {
                warn!("💳️ Could not fetch banks from Paystack ({e}). Using the test bank list.");
                Ok(mock_banks())
            },
            Err(e) => Err(to_gateway_error(e)),
        }
    }

    async fn resolve_account(&self, account_number: &str, bank_code: &str) -> Result<ResolvedAccount, GatewayError> {
        if self.test_mode {
            debug!("💳️ Resolving test account {account_number} at {bank_code}");
            return Ok(test_account(account_number, bank_code));
        }
        let account = self.api.resolve_account(account_number, bank_code).await.map_err(to_gateway_error)?;
        Ok(ResolvedAccount { account_number: account.account_number, account_name: account.account_name })
    }

    async fn create_recipient(&self, request: RecipientRequest) -> Result<String, GatewayError> {
        if self.test_mode {
            debug!("💳️ Using the test recipient for {}", request.name);
            return Ok(TEST_RECIPIENT_CODE.to_string());
        }
        let recipient = NewTransferRecipient::nuban(&request.name, &request.account_number, &request.bank_code);
        let recipient = self.api.create_transfer_recipient(&recipient).await.map_err(to_gateway_error)?;
        Ok(recipient.recipient_code)
    }
}
