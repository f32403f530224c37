//! Access token validation.
//!
//! Tokens are minted by the marketplace's identity service and signed with HS256 using the shared `MKT_JWT_SECRET`.
//! The server never issues tokens; it only checks the signature and expiry, and reads the account id and roles from
//! the claims.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    TimeOptions,
    UntrustedToken,
};
use log::trace;
use marketplace_engine::db_types::Role;
use mkt_common::Secret;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

/// The cookie that browser clients keep their access token in
pub const AUTH_COOKIE: &str = "authToken";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The user or seller account id, depending on the roles
    #[serde(rename = "id")]
    pub account_id: i64,
    pub roles: Vec<Role>,
}

impl JwtClaims {
    pub fn new(account_id: i64, roles: &[Role]) -> Self {
        Self { account_id, roles: roles.to_vec() }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// The buyer account id, if the caller is a buyer. Sellers shop as guests.
    pub fn user_id(&self) -> Option<i64> {
        self.has_role(Role::User).then_some(self.account_id)
    }

    pub fn seller_id(&self) -> Option<i64> {
        self.has_role(Role::Seller).then_some(self.account_id)
    }
}

/// Handlers that need an authenticated caller take `JwtClaims` as an argument; those that serve guests too take
/// `Option<JwtClaims>`. The claims are placed in the request extensions by the auth middleware.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

#[derive(Clone, Debug)]
pub struct TokenValidator {
    secret: Secret<String>,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self { secret: config.jwt_secret.clone() }
    }

    /// Checks the token's signature and expiry, returning its claims. Tokens without an expiry are rejected.
    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let untrusted = UntrustedToken::new(token).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let key = Hs256Key::new(self.secret.reveal().as_bytes());
        let token = Hs256
            .validator::<JwtClaims>(&key)
            .validate(&untrusted)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        token
            .claims()
            .validate_expiration(&TimeOptions::default())
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        trace!("🔐️ Access token validated for account #{}", token.claims().custom.account_id);
        Ok(token.claims().custom.clone())
    }
}

/// Extracts the raw access token from the `Authorization: Bearer` header, falling back to the auth cookie.
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    bearer.or_else(|| req.cookie(AUTH_COOKIE).map(|c| c.value().to_string()).filter(|s| !s.is_empty()))
}
