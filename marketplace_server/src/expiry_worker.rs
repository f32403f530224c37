use chrono::{Duration, Utc};
use log::*;
use marketplace_engine::{db_types::Order, events::EventProducers, OrderFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::integrations::paystack::PaystackGateway;

/// Starts the expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval`, card and bank transfer orders that have been awaiting payment for longer than `unpaid_expiry`
/// are marked as failed.
pub fn start_expiry_worker(
    db: SqliteDatabase,
    gateway: PaystackGateway,
    producers: EventProducers,
    unpaid_expiry: Duration,
    interval: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = OrderFlowApi::new(db, gateway, producers);
        info!("🕰️ Unpaid order expiry worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running unpaid order expiry job");
            let cutoff = Utc::now() - unpaid_expiry;
            match api.expire_stale_orders(cutoff).await {
                Ok(orders) if orders.is_empty() => trace!("🕰️ No stale orders"),
                Ok(orders) => {
                    info!("🕰️ {} unpaid orders expired", orders.len());
                    debug!("🕰️ Expired orders: {}", order_list(&orders));
                },
                Err(e) => {
                    error!("🕰️ Error running unpaid order expiry job: {e}");
                },
            }
        }
    })
}

fn order_list(orders: &[Order]) -> String {
    orders
        .iter()
        .map(|o| format!("[{}] {} created {}", o.id, o.total_amount, o.created_at))
        .collect::<Vec<String>>()
        .join(", ")
}
