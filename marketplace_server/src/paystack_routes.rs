//! Paystack webhook notifications.
//!
//! The webhook scope is wrapped in the signature middleware (and, optionally, an IP whitelist), so by the time a
//! request reaches these handlers, its body is known to come from Paystack.
//!
//! Only `charge.success` is acted on. Paystack retries notifications that do not get a 200 response, and duplicates
//! are harmless: verification is a no-op for orders that are no longer pending.
use actix_web::{web, HttpResponse};
use log::*;
use marketplace_engine::{
    traits::{MarketplaceDatabase, PaymentGateway},
    OrderFlowApi,
};
use paystack_tools::webhook::WebhookEvent;

use crate::{data_objects::WebhookResponse, route};

route!(paystack_webhook => Post "/paystack" impl MarketplaceDatabase, PaymentGateway);
pub async fn paystack_webhook<B: MarketplaceDatabase, G: PaymentGateway>(
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B, G>>,
) -> HttpResponse {
    trace!("💻️ Received Paystack webhook");
    let event = match serde_json::from_slice::<WebhookEvent>(body.as_ref()) {
        Ok(event) => event,
        Err(e) => {
            warn!("💻️ Could not parse Paystack webhook body. {e}");
            return HttpResponse::BadRequest().json(WebhookResponse::new("Invalid webhook payload"));
        },
    };
    let Some(reference) = event.charge_success_reference() else {
        debug!("💻️ Ignoring Paystack '{}' event", event.event);
        return HttpResponse::Ok().json(WebhookResponse::new("Webhook processed"));
    };
    match api.handle_charge_success(reference).await {
        Ok(Some(order)) => {
            info!("💻️ Webhook confirmed payment for order #{}", order.id);
            HttpResponse::Ok().json(WebhookResponse::new("Webhook processed"))
        },
        Ok(None) => HttpResponse::Ok().json(WebhookResponse::new("Webhook processed")),
        Err(e) => {
            error!("💻️ Could not process charge.success for {reference}. {e}");
            HttpResponse::InternalServerError().json(WebhookResponse::new("Webhook processing failed"))
        },
    }
}
