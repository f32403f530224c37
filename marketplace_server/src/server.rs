use std::{net::IpAddr, time::Duration};

use actix_web::{
    dev::{Server, Service, ServiceRequest},
    error::{JsonPayloadError, QueryPayloadError},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    Error,
    HttpRequest,
    HttpServer,
};
use futures::future::{ok, Either};
use log::*;
use marketplace_engine::{
    events::EventProducers,
    run_migrations,
    AccountApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
    SellerApi,
    SqliteDatabase,
};

use crate::{
    auth::TokenValidator,
    config::{ServerConfig, ServerOptions},
    errors::{AuthError, ServerError},
    expiry_worker::start_expiry_worker,
    helpers::get_remote_ip,
    integrations::{event_log::create_event_log_handlers, paystack::PaystackGateway},
    middleware::{AuthMiddlewareFactory, HmacMiddlewareFactory},
    paystack_routes::PaystackWebhookRoute,
    routes::{
        health,
        AddToCartRoute,
        ConfirmDeliveryRoute,
        CreateOrderRoute,
        CreateProductRoute,
        DeleteProductRoute,
        FeaturedProductsRoute,
        GetCartRoute,
        HotProductsRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        ProductByIdRoute,
        ProductsByCategoryRoute,
        ProductsRoute,
        RemoveFromCartRoute,
        SellerSignupRoute,
        SignupRoute,
        SpecialOffersRoute,
        StyleInspirationRoute,
        SyncCartRoute,
        TrendingProductsRoute,
        UpdateCartRoute,
        UpdateProductRoute,
        VerifyPaymentHandlerRoute,
    },
    seller_routes::{
        ListBanksRoute,
        SellerOrderByIdRoute,
        SellerOrdersRoute,
        SellerProductsRoute,
        SellerStatsRoute,
        SetupPaymentRoute,
        UpdateSellerProfileRoute,
        VerifyAccountRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = PaystackGateway::new(&config.paystack).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = create_event_log_handlers();
    let producers = handlers.producers();
    handlers.start_handlers().await;
    // The worker runs for the lifetime of the process
    let _worker = start_expiry_worker(
        db.clone(),
        gateway.clone(),
        producers.clone(),
        config.unpaid_order_timeout,
        config.unpaid_order_check_interval,
    );
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PaystackGateway,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    // Shared across workers, so that looked-up bank accounts are cached once
    let seller_api = web::Data::new(SellerApi::new(db.clone(), gateway.clone()));
    let options = ServerOptions::from_config(&config);
    let validator = TokenValidator::new(&config.auth);
    let webhook_key = config.paystack.api.secret_key.clone();
    let hmac_checks = config.paystack.hmac_checks;
    let whitelist = config.paystack.whitelist.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone());
        let catalog_api = CatalogApi::new(db.clone());
        let cart_api = CartApi::new(db.clone());
        let accounts_api = AccountApi::new(db.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mkt::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(accounts_api))
            .app_data(seller_api.clone())
            .app_data(web::Data::new(options.clone()))
            .app_data(json_config())
            .app_data(query_config());
        let seller_scope = web::scope("/seller")
            .service(SellerProductsRoute::<SqliteDatabase>::new())
            .service(SellerStatsRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(SellerOrdersRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(SellerOrderByIdRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(UpdateSellerProfileRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(ListBanksRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(VerifyAccountRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(SetupPaymentRoute::<SqliteDatabase, PaystackGateway>::new());
        // Static product paths must be registered before `/products/{id}`
        let api_scope = web::scope("/api")
            .wrap(AuthMiddlewareFactory::new(validator.clone()))
            .service(SignupRoute::<SqliteDatabase>::new())
            .service(SellerSignupRoute::<SqliteDatabase>::new())
            .service(CreateProductRoute::<SqliteDatabase>::new())
            .service(ProductsRoute::<SqliteDatabase>::new())
            .service(TrendingProductsRoute::<SqliteDatabase>::new())
            .service(HotProductsRoute::<SqliteDatabase>::new())
            .service(FeaturedProductsRoute::<SqliteDatabase>::new())
            .service(ProductsByCategoryRoute::<SqliteDatabase>::new())
            .service(SpecialOffersRoute::<SqliteDatabase>::new())
            .service(StyleInspirationRoute::<SqliteDatabase>::new())
            .service(ProductByIdRoute::<SqliteDatabase>::new())
            .service(UpdateProductRoute::<SqliteDatabase>::new())
            .service(DeleteProductRoute::<SqliteDatabase>::new())
            .service(AddToCartRoute::<SqliteDatabase>::new())
            .service(UpdateCartRoute::<SqliteDatabase>::new())
            .service(RemoveFromCartRoute::<SqliteDatabase>::new())
            .service(GetCartRoute::<SqliteDatabase>::new())
            .service(SyncCartRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(VerifyPaymentHandlerRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(MyOrdersRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(OrderByIdRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(ConfirmDeliveryRoute::<SqliteDatabase, PaystackGateway>::new())
            .service(seller_scope);
        let use_x_forwarded_for = options.use_x_forwarded_for;
        let use_forwarded = options.use_forwarded;
        let whitelist = whitelist.clone();
        let webhook_scope = web::scope("/api/webhook")
            .wrap(HmacMiddlewareFactory::new(webhook_key.clone(), hmac_checks))
            .wrap_fn(move |req: ServiceRequest, srv| {
                let peer_ip = get_remote_ip(req.request(), use_x_forwarded_for, use_forwarded);
                if is_whitelisted(peer_ip, whitelist.as_deref()) {
                    Either::Left(srv.call(req))
                } else {
                    let res = req.error_response(ServerError::AuthenticationError(AuthError::ForbiddenPeer));
                    Either::Right(ok::<_, Error>(res))
                }
            })
            .service(PaystackWebhookRoute::<SqliteDatabase, PaystackGateway>::new());
        // The webhook scope must be registered before the `/api` scope, which would otherwise claim its paths
        app.service(health).service(webhook_scope).service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// With no whitelist configured, every peer is allowed.
pub fn is_whitelisted(peer_ip: Option<IpAddr>, whitelist: Option<&[IpAddr]>) -> bool {
    match (peer_ip, whitelist) {
        (_, None) => true,
        (Some(ip), Some(whitelist)) => {
            let allowed = whitelist.contains(&ip);
            if allowed {
                debug!("💻️ Paystack webhook from {ip}");
            } else {
                warn!("💻️ Webhook call from {ip}, which is not a known Paystack address. Denying access.");
            }
            allowed
        },
        (None, Some(_)) => {
            warn!("💻️ No IP address found for webhook peer. Denying access.");
            false
        },
    }
}

/// Malformed JSON bodies are reported in the same `{"error": ..}` shape as every other client error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}
