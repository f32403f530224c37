use std::collections::HashMap;

use cucumber::World;
use log::*;
use marketplace_engine::{
    events::EventProducers,
    order_objects::{CheckoutResult, DeliveryConfirmation},
    CartApi,
    CatalogApi,
    OrderFlowApi,
    SellerApi,
    SqliteDatabase,
};

use crate::support::{gateway::ScriptedGateway, prepare_env::prepare_test_db};

#[derive(Default, Debug, World)]
pub struct MarketWorld {
    pub system: Option<Marketplace>,
}

#[derive(Debug)]
pub struct Marketplace {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub gateway: ScriptedGateway,
    pub sellers: HashMap<String, i64>,
    pub products: HashMap<String, i64>,
    pub last_checkout: Option<CheckoutResult>,
    pub last_error: Option<String>,
    pub last_confirmation: Option<DeliveryConfirmation>,
}

impl MarketWorld {
    pub fn system(&mut self) -> &mut Marketplace {
        self.system.as_mut().expect("Marketplace not initialised")
    }
}

impl Marketplace {
    pub async fn new() -> Self {
        let db = prepare_test_db().await;
        let db_path = marketplace_engine::MarketplaceDatabase::url(&db).to_string();
        debug!("🚀️ Marketplace database at {db_path}");
        Self {
            db_path,
            db,
            gateway: ScriptedGateway::new(),
            sellers: HashMap::new(),
            products: HashMap::new(),
            last_checkout: None,
            last_error: None,
            last_confirmation: None,
        }
    }

    pub fn orders(&self) -> OrderFlowApi<SqliteDatabase, ScriptedGateway> {
        OrderFlowApi::new(self.db.clone(), self.gateway.clone(), EventProducers::default())
    }

    pub fn carts(&self) -> CartApi<SqliteDatabase> {
        CartApi::new(self.db.clone())
    }

    pub fn catalog(&self) -> CatalogApi<SqliteDatabase> {
        CatalogApi::new(self.db.clone())
    }

    pub fn seller_api(&self) -> SellerApi<SqliteDatabase, ScriptedGateway> {
        SellerApi::new(self.db.clone(), self.gateway.clone())
    }

    pub fn seller_id(&self, name: &str) -> i64 {
        *self.sellers.get(name).unwrap_or_else(|| panic!("Unknown seller {name}"))
    }

    pub fn product_id(&self, title: &str) -> i64 {
        *self.products.get(title).unwrap_or_else(|| panic!("Unknown product {title}"))
    }

    pub fn checkout(&self) -> &CheckoutResult {
        self.last_checkout.as_ref().expect("No order has been placed")
    }
}
