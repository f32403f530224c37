//! Request handler definitions
//!
//! Define each route and its handler here. Seller dashboard routes live in [`crate::seller_routes`] and the payment
//! gateway webhook in [`crate::paystack_routes`].
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! gateway calls) must be expressed as futures or asynchronous functions.
//!
//! Authentication is optional on most routes. Buyers with an account are identified by their access token; guests
//! are identified by a session id that is generated when they first add to a cart.
use actix_web::{get, http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use log::*;
use marketplace_engine::{
    db_types::{NewProduct, NewSeller, NewUser, ProductUpdate, Role},
    order_objects::{CheckoutRequest, OrderViewer},
    traits::{AccountManagement, CatalogManagement, MarketplaceDatabase, PaymentGateway},
    AccountApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
};

use crate::{
    auth::JwtClaims,
    config::ServerOptions,
    data_objects::{
        CartItemRequest,
        CategoryQuery,
        CheckoutResponse,
        DeliveryResponse,
        JsonResponse,
        OrdersQuery,
        SessionQuery,
        SyncCartRequest,
        VerifiedPaymentResponse,
        VerifyPaymentParams,
    },
    errors::ServerError,
    helpers::callback_origin,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Accounts  ----------------------------------------------------
route!(signup => Post "/signup" impl AccountManagement);
pub async fn signup<B: AccountManagement>(
    body: web::Json<NewUser>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received signup request");
    let user = api.register_user(body.into_inner()).await?;
    info!("💻️ New buyer account #{}", user.id);
    Ok(HttpResponse::Created().json(user))
}

route!(seller_signup => Post "/seller-signup" impl AccountManagement);
pub async fn seller_signup<B: AccountManagement>(
    body: web::Json<NewSeller>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received seller signup request");
    let seller = api.register_seller(body.into_inner()).await?;
    info!("💻️ New seller account #{} for {}", seller.id, seller.store_name);
    Ok(HttpResponse::Created().json(seller))
}

//----------------------------------------------   Catalog  ----------------------------------------------------
route!(create_product => Post "/products" impl CatalogManagement where requires [Role::Seller]);
pub async fn create_product<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ Seller #{} is listing a new product", claims.account_id);
    let product = api.create_product(claims.account_id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

route!(products => Get "/products" impl CatalogManagement);
pub async fn products<B: CatalogManagement>(
    query: web::Query<CategoryQuery>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET products ({:?})", query.category);
    let products = api.all_products(query.category).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(trending_products => Get "/products/trending" impl CatalogManagement);
pub async fn trending_products<B: CatalogManagement>(
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    Ok(HttpResponse::Ok().json(api.trending().await?))
}

route!(hot_products => Get "/products/hot" impl CatalogManagement);
pub async fn hot_products<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    Ok(HttpResponse::Ok().json(api.hot().await?))
}

route!(featured_products => Get "/products/featured" impl CatalogManagement);
pub async fn featured_products<B: CatalogManagement>(
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    Ok(HttpResponse::Ok().json(api.featured().await?))
}

route!(products_by_category => Get "/products/category" impl CatalogManagement);
pub async fn products_by_category<B: CatalogManagement>(
    query: web::Query<CategoryQuery>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let category = query.category.ok_or_else(|| ServerError::InvalidRequestBody("Category is required".into()))?;
    Ok(HttpResponse::Ok().json(api.by_category(category).await?))
}

route!(special_offers => Get "/products/special-offers" impl CatalogManagement);
pub async fn special_offers<B: CatalogManagement>(
    claims: Option<JwtClaims>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    Ok(HttpResponse::Ok().json(api.special_offers(claims.is_some()).await?))
}

route!(style_inspiration => Get "/products/style-inspiration" impl CatalogManagement);
pub async fn style_inspiration<B: CatalogManagement>(
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    Ok(HttpResponse::Ok().json(api.style_inspiration().await?))
}

route!(product_by_id => Get "/products/{id}" impl CatalogManagement);
pub async fn product_by_id<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product = api.product_by_id(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(update_product => Patch "/products/{id}" impl CatalogManagement where requires [Role::Seller]);
pub async fn update_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<ProductUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ Seller #{} is updating product #{product_id}", claims.account_id);
    let product = api.update_product(claims.account_id, product_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/products/{id}" impl CatalogManagement where requires [Role::Seller]);
pub async fn delete_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    api.delete_product(claims.account_id, product_id).await?;
    info!("💻️ Seller #{} deleted product #{product_id}", claims.account_id);
    Ok(HttpResponse::Ok().json(JsonResponse::success("Product deleted")))
}

//----------------------------------------------   Cart  ----------------------------------------------------
// Sellers and admins have no cart of their own, so only the buyer role is carried through. Everyone else shops
// with a session id.

route!(add_to_cart => Post "/cart/add" impl MarketplaceDatabase);
pub async fn add_to_cart<B: MarketplaceDatabase>(
    claims: Option<JwtClaims>,
    body: web::Json<CartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let CartItemRequest { product_id, quantity, session_id } = body.into_inner();
    let user_id = claims.and_then(|c| c.user_id());
    let result = api.add_item(user_id, session_id, product_id, quantity).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(update_cart => Put "/cart/update" impl MarketplaceDatabase);
pub async fn update_cart<B: MarketplaceDatabase>(
    claims: Option<JwtClaims>,
    body: web::Json<CartItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let CartItemRequest { product_id, quantity, session_id } = body.into_inner();
    let user_id = claims.and_then(|c| c.user_id());
    let result = api.update_item(user_id, session_id, product_id, quantity).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(remove_from_cart => Delete "/cart/remove/{product_id}" impl MarketplaceDatabase);
pub async fn remove_from_cart<B: MarketplaceDatabase>(
    claims: Option<JwtClaims>,
    path: web::Path<i64>,
    query: web::Query<SessionQuery>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.and_then(|c| c.user_id());
    let result = api.remove_item(user_id, query.into_inner().session_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(get_cart => Get "/cart" impl MarketplaceDatabase);
pub async fn get_cart<B: MarketplaceDatabase>(
    claims: Option<JwtClaims>,
    query: web::Query<SessionQuery>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.and_then(|c| c.user_id());
    let result = api.get_cart(user_id, query.into_inner().session_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(sync_cart => Post "/cart/sync" impl MarketplaceDatabase);
pub async fn sync_cart<B: MarketplaceDatabase>(
    claims: Option<JwtClaims>,
    body: web::Json<SyncCartRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let SyncCartRequest { items, session_id } = body.into_inner();
    let user_id = claims.and_then(|c| c.user_id());
    let result = api.sync_cart(user_id, session_id, items).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/create-order" impl MarketplaceDatabase, PaymentGateway);
pub async fn create_order<B: MarketplaceDatabase, G: PaymentGateway>(
    req: HttpRequest,
    claims: Option<JwtClaims>,
    body: web::Json<CheckoutRequest>,
    options: web::Data<ServerOptions>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = claims.and_then(|c| c.user_id());
    let origin = callback_origin(&req, &options.frontend_url);
    let buyer = user_id.map(|id| format!("buyer #{id}")).unwrap_or_else(|| "a guest".into());
    debug!("💻️ Checkout request from {buyer} with origin {origin}");
    let result = api.create_order(user_id, body.into_inner(), &origin).await?;
    Ok(HttpResponse::Created().json(CheckoutResponse::from(result)))
}

route!(verify_payment_handler => Get "/verify-payment-handler" impl MarketplaceDatabase, PaymentGateway);
pub async fn verify_payment_handler<B: MarketplaceDatabase, G: PaymentGateway>(
    query: web::Query<VerifyPaymentParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let VerifyPaymentParams { reference, order_id } = query.into_inner();
    debug!("💻️ Verifying payment {reference} for order #{order_id}");
    let order = api.verify_payment(&reference, order_id).await?;
    let details = api.with_products(order).await?;
    let response = VerifiedPaymentResponse { message: "Payment verified successfully".into(), details };
    Ok(HttpResponse::Ok().json(response))
}

route!(my_orders => Get "/orders" impl MarketplaceDatabase, PaymentGateway where requires [Role::User, Role::Seller]);
pub async fn my_orders<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    query: web::Query<OrdersQuery>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let orders = match claims.seller_id() {
        Some(seller_id) => api.orders_for_seller(seller_id, query.status).await?,
        None => api.orders_for_user(claims.account_id).await?,
    };
    trace!("💻️ {} orders for account #{}", orders.len(), claims.account_id);
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_by_id => Get "/orders/{id}" impl MarketplaceDatabase, PaymentGateway
    where requires [Role::User, Role::Seller, Role::Admin]);
pub async fn order_by_id<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let viewer = if claims.is_admin() {
        OrderViewer::Admin
    } else if let Some(seller_id) = claims.seller_id() {
        OrderViewer::Seller(seller_id)
    } else {
        OrderViewer::User(claims.account_id)
    };
    let details = api.order_details(path.into_inner(), viewer).await?;
    Ok(HttpResponse::Ok().json(details))
}

route!(confirm_delivery => Post "/orders/{id}/confirm-delivery" impl MarketplaceDatabase, PaymentGateway
    where requires [Role::User, Role::Admin]);
pub async fn confirm_delivery<B: MarketplaceDatabase, G: PaymentGateway>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    info!("💻️ Account #{} is confirming delivery of order #{order_id}", claims.account_id);
    let confirmation = api.confirm_delivery(order_id, claims.account_id, claims.is_admin()).await?;
    let status = if confirmation.all_successful {
        StatusCode::OK
    } else {
        warn!("💻️ {} payout(s) failed for order #{order_id}", confirmation.failed_count());
        StatusCode::MULTI_STATUS
    };
    Ok(HttpResponse::build(status).json(DeliveryResponse::from(confirmation)))
}
