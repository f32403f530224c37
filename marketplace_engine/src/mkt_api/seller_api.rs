//! Seller profiles, dashboard figures and payout setup.
use std::{fmt::Debug, time::Duration};

use log::*;
use moka::future::Cache;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{PayoutDetails, Seller, SellerProfileUpdate, SellerStats},
    helpers::{is_valid_account_number, mask_account_number, normalize_email},
    mkt_api::errors::SellerApiError,
    traits::{AccountError, AccountManagement, BankInfo, PaymentGateway, RecipientRequest, ResolvedAccount},
};

/// Account lookups are rate limited by the gateway, so answers are kept for a while.
pub const ACCOUNT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);
const ACCOUNT_CACHE_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSetupRequest {
    pub bank_code: String,
    pub account_number: String,
    pub account_name: String,
    #[serde(default)]
    pub bank_name: Option<String>,
}

pub struct SellerApi<B, G> {
    db: B,
    gateway: G,
    resolved_accounts: Cache<String, ResolvedAccount>,
}

impl<B: Debug, G> Debug for SellerApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SellerApi ({:?}, {} cached accounts)", self.db, self.resolved_accounts.entry_count())
    }
}

impl<B, G> SellerApi<B, G>
where
    B: AccountManagement,
    G: PaymentGateway,
{
    pub fn new(db: B, gateway: G) -> Self {
        let resolved_accounts =
            Cache::builder().max_capacity(ACCOUNT_CACHE_CAPACITY).time_to_live(ACCOUNT_CACHE_TTL).build();
        Self { db, gateway, resolved_accounts }
    }

    pub async fn seller(&self, seller_id: i64) -> Result<Seller, SellerApiError> {
        let seller = self.db.fetch_seller(seller_id).await?.ok_or(AccountError::SellerNotFound(seller_id))?;
        Ok(seller)
    }

    /// Updates the given profile fields. A new email must not belong to another seller.
    pub async fn update_profile(
        &self,
        seller_id: i64,
        mut update: SellerProfileUpdate,
    ) -> Result<Seller, SellerApiError> {
        if let Some(email) = update.email.take() {
            let email = normalize_email(&email);
            if email.is_empty() {
                return Err(SellerApiError::InvalidInput("Email cannot be blank".into()));
            }
            if let Some(other) = self.db.fetch_seller_by_email(&email).await? {
                if other.id != seller_id {
                    return Err(AccountError::EmailInUse(email).into());
                }
            }
            update.email = Some(email);
        }
        let seller =
            self.db.update_seller_profile(seller_id, update).await?.ok_or(AccountError::SellerNotFound(seller_id))?;
        debug!("🏪️ Seller #{seller_id} updated their profile");
        Ok(seller)
    }

    pub async fn stats(&self, seller_id: i64) -> Result<SellerStats, SellerApiError> {
        Ok(self.db.fetch_seller_stats(seller_id).await?)
    }

    pub async fn list_banks(&self) -> Result<Vec<BankInfo>, SellerApiError> {
        Ok(self.gateway.list_banks().await?)
    }

    /// Looks up the name on a bank account. Results are cached for [`ACCOUNT_CACHE_TTL`].
    pub async fn verify_bank_account(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> Result<ResolvedAccount, SellerApiError> {
        let account_number = account_number.trim();
        let bank_code = bank_code.trim();
        if account_number.is_empty() || bank_code.is_empty() {
            return Err(SellerApiError::InvalidInput("Account number and bank code are required".into()));
        }
        if !is_valid_account_number(account_number) {
            return Err(SellerApiError::InvalidInput("Account number must be 10 digits".into()));
        }
        let key = format!("{account_number}-{bank_code}");
        if let Some(account) = self.resolved_accounts.get(&key).await {
            trace!("🏪️ Account {key} served from cache");
            return Ok(account);
        }
        let account = self.gateway.resolve_account(account_number, bank_code).await?;
        self.resolved_accounts.insert(key, account.clone()).await;
        Ok(account)
    }

    /// One-time payout setup. The account is resolved with the gateway, whose account name takes precedence over the
    /// one supplied, and registered as a transfer recipient.
    pub async fn setup_payment(&self, seller_id: i64, request: PaymentSetupRequest) -> Result<Seller, SellerApiError> {
        if request.bank_code.trim().is_empty()
            || request.account_number.trim().is_empty()
            || request.account_name.trim().is_empty()
        {
            return Err(SellerApiError::InvalidInput(
                "Bank code, account number, and account name are required".into(),
            ));
        }
        if !is_valid_account_number(request.account_number.trim()) {
            return Err(SellerApiError::InvalidInput("Account number must be exactly 10 digits".into()));
        }
        let seller = self.seller(seller_id).await?;
        if seller.is_payment_setup {
            return Err(AccountError::PaymentAlreadySetup.into());
        }
        let resolved = self.verify_bank_account(&request.account_number, &request.bank_code).await?;
        let bank_code = request.bank_code.trim().to_string();
        let recipient = RecipientRequest {
            name: resolved.account_name.clone(),
            account_number: resolved.account_number.clone(),
            bank_code: bank_code.clone(),
        };
        let recipient_code = self.gateway.create_recipient(recipient).await?;
        let bank_name =
            request.bank_name.filter(|n| !n.trim().is_empty()).unwrap_or_else(|| format!("Bank ({bank_code})"));
        let details = PayoutDetails {
            recipient_code,
            bank_code,
            masked_account_number: mask_account_number(&resolved.account_number),
            account_name: resolved.account_name,
            bank_name,
        };
        let seller = self.db.set_seller_payout_details(seller_id, details).await?;
        info!("🏪️ Payouts configured for seller #{seller_id} ({})", seller.store_name);
        Ok(seller)
    }
}
