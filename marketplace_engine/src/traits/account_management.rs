use thiserror::Error;

use crate::db_types::{NewSeller, NewUser, PayoutDetails, Seller, SellerProfileUpdate, SellerStats, User};

#[derive(Debug, Clone, Error)]
pub enum AccountError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User {0} not found")]
    UserNotFound(i64),
    #[error("Seller {0} not found")]
    SellerNotFound(i64),
    #[error("Email already in use: {0}")]
    EmailInUse(String),
    #[error("Invalid account details: {0}")]
    InvalidInput(String),
    #[error("Payment is already setup for this seller")]
    PaymentAlreadySetup,
}

impl From<sqlx::Error> for AccountError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Database(ref de) if de.is_unique_violation() => {
                AccountError::EmailInUse(de.message().to_string())
            },
            e => AccountError::DatabaseError(e.to_string()),
        }
    }
}

/// Buyer and seller profiles.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn insert_user(&self, user: NewUser) -> Result<User, AccountError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountError>;

    async fn insert_seller(&self, seller: NewSeller) -> Result<Seller, AccountError>;

    async fn fetch_seller(&self, seller_id: i64) -> Result<Option<Seller>, AccountError>;

    async fn fetch_seller_by_email(&self, email: &str) -> Result<Option<Seller>, AccountError>;

    async fn update_seller_profile(
        &self,
        seller_id: i64,
        update: SellerProfileUpdate,
    ) -> Result<Option<Seller>, AccountError>;

    /// Stores payout details, but only if payouts have not been configured for this seller before.
    /// Implementations must return [`AccountError::PaymentAlreadySetup`] otherwise.
    async fn set_seller_payout_details(&self, seller_id: i64, details: PayoutDetails) -> Result<Seller, AccountError>;

    async fn fetch_seller_stats(&self, seller_id: i64) -> Result<SellerStats, AccountError>;
}
