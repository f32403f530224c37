//! Seller dashboard routes, mounted under `/api/seller`. Every route here requires the seller role, and acts on the
//! caller's own store.
use actix_web::{web, HttpResponse};
use log::*;
use marketplace_engine::{
    db_types::{Role, SellerProfileUpdate},
    traits::{AccountManagement, CatalogManagement, MarketplaceDatabase, PaymentGateway},
    CatalogApi,
    OrderFlowApi,
    PaymentSetupRequest,
    SellerApi,
};
use serde_json::json;

use crate::{
    auth::JwtClaims,
    data_objects::{CategoryQuery, OrdersQuery, VerifyAccountRequest},
    errors::ServerError,
    route,
};

route!(seller_products => Get "/products" impl CatalogManagement where requires [Role::Seller]);
pub async fn seller_products<B: CatalogManagement>(
    claims: JwtClaims,
    query: web::Query<CategoryQuery>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let products = api.seller_products(claims.account_id, query.category).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(seller_stats => Get "/stats" impl AccountManagement, PaymentGateway where requires [Role::Seller]);
pub async fn seller_stats<B: AccountManagement, G: PaymentGateway>(
    claims: JwtClaims,
    api: web::Data<SellerApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let stats = api.stats(claims.account_id).await?;
    Ok(HttpResponse::Ok().json(stats))
}

route!(seller_orders => Get "/orders" impl MarketplaceDatabase, PaymentGateway where requires [Role::Seller]);
pub async fn seller_orders<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    query: web::Query<OrdersQuery>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let orders = api.orders_for_seller(claims.account_id, query.status).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(seller_order_by_id => Get "/orders/{id}" impl MarketplaceDatabase, PaymentGateway where requires [Role::Seller]);
pub async fn seller_order_by_id<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let details = api.seller_order_details(claims.account_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(details))
}

route!(update_seller_profile => Put "/profile" impl AccountManagement, PaymentGateway where requires [Role::Seller]);
pub async fn update_seller_profile<B: AccountManagement, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<SellerProfileUpdate>,
    api: web::Data<SellerApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let seller = api.update_profile(claims.account_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Profile updated successfully", "seller": seller })))
}

route!(list_banks => Get "/banks" impl AccountManagement, PaymentGateway where requires [Role::Seller]);
pub async fn list_banks<B: AccountManagement, G: PaymentGateway>(
    api: web::Data<SellerApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let banks = api.list_banks().await?;
    Ok(HttpResponse::Ok().json(json!({ "banks": banks })))
}

route!(verify_account => Post "/verify-account" impl AccountManagement, PaymentGateway where requires [Role::Seller]);
pub async fn verify_account<B: AccountManagement, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<VerifyAccountRequest>,
    api: web::Data<SellerApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let VerifyAccountRequest { account_number, bank_code } = body.into_inner();
    trace!("🏪️ Seller #{} is verifying an account at bank {bank_code}", claims.account_id);
    let account = api.verify_bank_account(&account_number, &bank_code).await?;
    Ok(HttpResponse::Ok().json(account))
}

route!(setup_payment => Post "/payment/setup" impl AccountManagement, PaymentGateway where requires [Role::Seller]);
pub async fn setup_payment<B: AccountManagement, G: PaymentGateway>(
    claims: JwtClaims,
    body: web::Json<PaymentSetupRequest>,
    api: web::Data<SellerApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let seller = api.setup_payment(claims.account_id, body.into_inner()).await?;
    info!("🏪️ Seller #{} can now receive payouts", seller.id);
    Ok(HttpResponse::Ok().json(json!({ "message": "Payment details saved successfully", "seller": seller })))
}
