//! Default subscribers for order lifecycle events.
//!
//! These only write to the log, so that each state change and every failed payout leaves a trail that operators can
//! follow up on. Payouts are never retried automatically.
use futures::future::BoxFuture;
use log::*;
use marketplace_engine::events::{EventHandlers, EventHooks};

pub const EVENT_BUFFER_SIZE: usize = 25;

pub fn create_event_log_handlers() -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks
        .on_order_created(|ev| {
            let order = ev.order;
            info!(
                "📬️ Order #{} created. {} via {} ({})",
                order.id, order.total_amount, order.payment_method, order.payment_status
            );
            no_op()
        })
        .on_payment_confirmed(|ev| {
            info!("📬️ Payment for order #{} confirmed. Funds are on hold until delivery.", ev.order.id);
            no_op()
        })
        .on_order_paid(|ev| {
            let total = ev.payouts.iter().map(|p| p.amount).sum::<marketplace_engine::db_types::Kobo>();
            info!("📬️ Order #{} is paid. {} sent to {} seller(s).", ev.order.id, total, ev.payouts.len());
            no_op()
        })
        .on_order_failed(|ev| {
            warn!("📬️ Order #{} failed. {}", ev.order.id, ev.reason);
            no_op()
        })
        .on_payout_failed(|ev| {
            error!(
                "📬️ Payout of {} to seller #{} for order #{} failed and needs attention. {}",
                ev.amount, ev.seller_id, ev.order_id, ev.reason
            );
            no_op()
        });
    EventHandlers::new(EVENT_BUFFER_SIZE, hooks)
}

fn no_op() -> BoxFuture<'static, ()> {
    Box::pin(async {})
}
