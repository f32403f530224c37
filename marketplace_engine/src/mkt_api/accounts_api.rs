use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewSeller, NewUser, Seller, User},
    helpers::normalize_email,
    traits::{AccountError, AccountManagement},
};

/// Registration and lookup of buyer and seller accounts.
pub struct AccountApi<B> {
    db: B,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn register_user(&self, mut user: NewUser) -> Result<User, AccountError> {
        user.email = normalize_email(&user.email);
        user.username = user.username.trim().to_string();
        if user.username.is_empty() || user.email.is_empty() {
            return Err(AccountError::InvalidInput("Username and email are required".into()));
        }
        let email = user.email.clone();
        let user = self.db.insert_user(user).await.map_err(|e| match e {
            AccountError::EmailInUse(_) => AccountError::EmailInUse(email),
            e => e,
        })?;
        info!("👤️ New user #{} registered", user.id);
        Ok(user)
    }

    pub async fn register_seller(&self, mut seller: NewSeller) -> Result<Seller, AccountError> {
        seller.email = normalize_email(&seller.email);
        if seller.store_name.trim().is_empty()
            || seller.email.is_empty()
            || seller.phone_number.trim().is_empty()
            || seller.address.trim().is_empty()
        {
            return Err(AccountError::InvalidInput("Store name, email, phone number and address are required".into()));
        }
        if self.db.fetch_seller_by_email(&seller.email).await?.is_some() {
            return Err(AccountError::EmailInUse(seller.email));
        }
        let seller = self.db.insert_seller(seller).await?;
        info!("👤️ New seller #{} ({}) registered", seller.id, seller.store_name);
        Ok(seller)
    }

    pub async fn fetch_user(&self, user_id: i64) -> Result<User, AccountError> {
        self.db.fetch_user(user_id).await?.ok_or(AccountError::UserNotFound(user_id))
    }

    pub async fn fetch_seller(&self, seller_id: i64) -> Result<Seller, AccountError> {
        self.db.fetch_seller(seller_id).await?.ok_or(AccountError::SellerNotFound(seller_id))
    }
}
