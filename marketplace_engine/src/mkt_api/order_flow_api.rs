//! The order and payment lifecycle.
//!
//! An order is created from the buyer's checkout request in `pending` status. Pay-on-delivery orders move straight to
//! `hold`. Every other order gets a gateway charge, and moves to `hold` once the charge is verified, either through
//! the gateway webhook or because the buyer's browser polls for it. When the buyer confirms delivery, each seller is
//! paid their share of the order, and the order becomes `paid` if every transfer went through.
//!
//! ```text
//!   pending ──(charge verified / pay on delivery)──► hold ──(all payouts succeed)──► paid
//!      │
//!      └──(charge failed / abandoned / expired)──► failed
//! ```
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use mkt_common::Kobo;

use crate::{
    db_types::{CartOwner, NewOrder, NewOrderItem, Order, PaymentMethod, PaymentStatus},
    events::{
        EventProducers,
        OrderCreatedEvent,
        OrderFailedEvent,
        OrderPaidEvent,
        PaymentConfirmedEvent,
        PayoutFailedEvent,
    },
    helpers::{normalize_email, payment_callback_url, payment_reference, transfer_reference, MINIMUM_CHARGE_KOBO},
    mkt_api::errors::OrderFlowError,
    order_objects::{
        CheckoutRequest,
        CheckoutResult,
        DeliveryConfirmation,
        OrderDetails,
        OrderViewer,
        PayoutResult,
        ProductSummary,
    },
    traits::{ChargeRequest, GatewayMode, MarketplaceDatabase, OrderManagementError, PaymentGateway, TransferRequest},
};

pub const SELLER_NOT_CONFIGURED: &str = "Seller payment details not configured";

pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B: Debug, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.db)
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: MarketplaceDatabase,
    G: PaymentGateway,
{
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway_mode(&self) -> GatewayMode {
        self.gateway.mode()
    }

    /// Turns a checkout request into an order.
    ///
    /// Every line is checked against the live catalog. Missing products and quantities above stock are rejected.
    /// Lines are always charged at the live price; `has_price_changes` tells the buyer that this differs from what
    /// they saw. `origin` is the storefront URL the gateway redirects back to.
    pub async fn create_order(
        &self,
        user_id: Option<i64>,
        request: CheckoutRequest,
        origin: &str,
    ) -> Result<CheckoutResult, OrderFlowError> {
        let owner = match user_id {
            Some(id) => CartOwner::User(id),
            None => match request.session_id.as_deref().map(str::trim) {
                Some(s) if !s.is_empty() => CartOwner::Guest(s.to_string()),
                _ => return Err(OrderFlowError::MissingSession),
            },
        };
        let email = self.buyer_email(user_id, &request).await?;
        let mut missing = request.shipping_info.missing_fields();
        if request.items.is_empty() {
            missing.push("items");
        }
        if email.is_empty() && !missing.contains(&"email") {
            missing.push("email");
        }
        if !missing.is_empty() {
            return Err(OrderFlowError::MissingFields(missing.join(", ")));
        }

        let mut items = Vec::with_capacity(request.items.len());
        let mut has_price_changes = false;
        for item in &request.items {
            if item.quantity < 1 {
                return Err(OrderFlowError::InvalidQuantity);
            }
            let product =
                self.db.fetch_product(item.product_id).await?.ok_or(OrderFlowError::ProductNotFound(item.product_id))?;
            if product.stock < item.quantity {
                return Err(OrderFlowError::InsufficientStock { title: product.title, available: product.stock });
            }
            if product.price != item.price {
                debug!("🔄️ Price of {} changed from {} to {}", product.title, item.price, product.price);
                has_price_changes = true;
            }
            items.push(NewOrderItem {
                product_id: product.id,
                seller_id: product.seller_id,
                quantity: item.quantity,
                unit_price: product.price,
            });
        }
        let new_order = NewOrder::new(owner.clone(), request.shipping_info, items, request.payment_method);
        if !has_price_changes && new_order.total_amount != request.total_amount {
            warn!(
                "🔄️ Checkout total from {owner} was {}, but the items add up to {}. Charging {}.",
                request.total_amount, new_order.total_amount, new_order.total_amount
            );
        }
        let payment_method = new_order.payment_method;
        if payment_method.requires_gateway() && new_order.total_amount.value() < MINIMUM_CHARGE_KOBO {
            return Err(OrderFlowError::AmountTooSmall);
        }

        let order = self.db.insert_order(new_order).await?;
        info!("🔄️ Order #{} created for {owner}. Total: {}", order.id, order.total_amount);
        self.producers.publish_order_created(OrderCreatedEvent::new(order.clone())).await;

        if payment_method == PaymentMethod::PayOnDelivery {
            let order = self.db.mark_order_on_hold(order.id, Utc::now()).await?;
            self.db.delete_cart(&owner).await?;
            info!("🔄️ Order #{} is pay on delivery and is now on hold", order.id);
            self.producers.publish_payment_confirmed(PaymentConfirmedEvent::new(order.clone())).await;
            return Ok(CheckoutResult {
                order,
                payment_required: false,
                authorization_url: None,
                reference: None,
                has_price_changes,
            });
        }

        let charge = ChargeRequest {
            order_id: order.id,
            email,
            amount: order.total_amount,
            reference: payment_reference(order.id, Utc::now()),
            callback_url: payment_callback_url(origin, order.id),
        };
        let authorization = match self.gateway.initialize_charge(charge).await {
            Ok(auth) => auth,
            Err(e) => {
                error!("🔄️ Could not initialize payment for order #{}: {e}", order.id);
                let failed = self.db.mark_order_failed(order.id).await?;
                self.producers.publish_order_failed(OrderFailedEvent::new(failed, e.to_string())).await;
                return Err(e.into());
            },
        };
        let order =
            self.db.set_payment_reference(order.id, &authorization.reference, &authorization.authorization_url).await?;
        debug!("🔄️ Order #{} awaiting payment with reference {}", order.id, authorization.reference);
        Ok(CheckoutResult {
            order,
            payment_required: true,
            authorization_url: Some(authorization.authorization_url),
            reference: Some(authorization.reference),
            has_price_changes,
        })
    }

    /// Confirms a charge with the gateway and puts the order on hold.
    ///
    /// Calling this for an order that is already on hold (or paid) returns it unchanged, so duplicate webhooks and
    /// repeated polling are harmless.
    pub async fn verify_payment(&self, reference: &str, order_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.payment_reference.as_deref() != Some(reference) {
            warn!("🔄️ Reference {reference} does not belong to order #{order_id}");
            return Err(OrderFlowError::ReferenceMismatch);
        }
        if matches!(order.payment_status, PaymentStatus::Hold | PaymentStatus::Paid) {
            debug!("🔄️ Order #{order_id} was already confirmed");
            return Ok(order);
        }
        let verification = self.gateway.verify_charge(reference).await?;
        if !verification.is_successful() {
            info!("🔄️ Charge {reference} for order #{order_id} is '{}'", verification.status);
            if verification.is_definitive_failure() && order.payment_status == PaymentStatus::Pending {
                let failed = self.db.mark_order_failed(order_id).await?;
                let reason = format!("Payment {}", verification.status);
                self.producers.publish_order_failed(OrderFailedEvent::new(failed, reason)).await;
            }
            return Err(OrderFlowError::PaymentNotSuccessful(verification.status));
        }
        if verification.amount < order.total_amount {
            error!(
                "🔄️ Charge {reference} paid {} but order #{order_id} costs {}",
                verification.amount, order.total_amount
            );
            return Err(OrderFlowError::AmountMismatch {
                paid: verification.amount.value(),
                expected: order.total_amount.value(),
            });
        }
        let order = match self.db.mark_order_on_hold(order_id, Utc::now()).await {
            Ok(order) => order,
            // Another verification of the same charge got there first
            Err(e @ OrderManagementError::IllegalTransition { .. }) => {
                let current = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
                if matches!(current.payment_status, PaymentStatus::Hold | PaymentStatus::Paid) {
                    debug!("🔄️ Order #{order_id} was confirmed concurrently");
                    return Ok(current);
                }
                return Err(e.into());
            },
            Err(e) => return Err(e.into()),
        };
        if let Some(owner) = order.owner() {
            self.db.delete_cart(&owner).await?;
        }
        info!("🔄️ Payment for order #{order_id} confirmed. Funds are on hold until delivery.");
        self.producers.publish_payment_confirmed(PaymentConfirmedEvent::new(order.clone())).await;
        Ok(order)
    }

    /// Handles a verified `charge.success` notification. Only pending orders are verified; anything else is ignored
    /// and `None` is returned.
    pub async fn handle_charge_success(&self, reference: &str) -> Result<Option<Order>, OrderFlowError> {
        match self.db.fetch_order_by_reference(reference).await? {
            Some(order) if order.payment_status == PaymentStatus::Pending => {
                self.verify_payment(reference, order.id).await.map(Some)
            },
            Some(order) => {
                debug!("🔄️ Ignoring charge.success for order #{} in status {}", order.id, order.payment_status);
                Ok(None)
            },
            None => {
                debug!("🔄️ No order has reference {reference}");
                Ok(None)
            },
        }
    }

    /// The buyer (or an admin) confirms that the order arrived. Each seller is sent their share, and the order is
    /// marked paid if every transfer succeeded. Failed transfers are reported, not retried.
    pub async fn confirm_delivery(
        &self,
        order_id: i64,
        user_id: i64,
        is_admin: bool,
    ) -> Result<DeliveryConfirmation, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if !is_admin && !order.is_owned_by_user(user_id) {
            return Err(OrderFlowError::NotAuthorized);
        }
        if order.payment_status != PaymentStatus::Hold {
            return Err(OrderFlowError::NotOnHold);
        }
        if order.seller_paid_at.is_some() {
            return Err(OrderFlowError::SellersAlreadyPaid);
        }
        // Only one confirmation at a time may move money for this order
        if !self.db.claim_payout(order_id, Utc::now()).await? {
            info!("🔄️ Payouts for order #{order_id} are already under way or done");
            return Err(OrderFlowError::SellersAlreadyPaid);
        }
        let mode = self.gateway.mode();
        let mut payments = Vec::new();
        for (seller_id, amount) in order.seller_totals() {
            let result = self.pay_seller(&order, seller_id, amount, mode).await;
            if !result.success {
                let reason = result.error.clone().unwrap_or_default();
                warn!("🔄️ Payout of {amount} to seller #{seller_id} for order #{order_id} failed: {reason}");
                let event = PayoutFailedEvent { order_id, seller_id, amount, reason };
                self.producers.publish_payout_failed(event).await;
            }
            payments.push(result);
        }
        let all_successful = payments.iter().all(|p| p.success);
        let order = if all_successful {
            let paid = self.db.mark_order_paid(order_id, Utc::now()).await.map_err(|e| match e {
                OrderManagementError::IllegalTransition { .. } => OrderFlowError::SellersAlreadyPaid,
                e => e.into(),
            })?;
            info!("🔄️ All {} seller(s) paid for order #{order_id} ({mode} mode)", payments.len());
            self.producers.publish_order_paid(OrderPaidEvent::new(paid.clone(), payments.clone())).await;
            paid
        } else {
            if let Err(e) = self.db.release_payout(order_id).await {
                error!("🔄️ Could not release the payout claim on order #{order_id}. {e}");
            }
            order
        };
        Ok(DeliveryConfirmation { order, payments, mode, all_successful })
    }

    async fn pay_seller(
        &self,
        order: &Order,
        seller_id: i64,
        amount: Kobo,
        mode: GatewayMode,
    ) -> PayoutResult {
        let seller = match self.db.fetch_seller(seller_id).await {
            Ok(seller) => seller,
            Err(e) => {
                error!("🔄️ Could not look up seller #{seller_id} to pay for order #{}. {e}", order.id);
                return PayoutResult::failure(seller_id, amount, format!("Could not look up seller. {e}"), mode);
            },
        };
        let Some(recipient_code) = seller.and_then(|s| s.recipient_code).filter(|c| !c.is_empty()) else {
            return PayoutResult::failure(seller_id, amount, SELLER_NOT_CONFIGURED.to_string(), mode);
        };
        let request = TransferRequest {
            order_id: order.id,
            seller_id,
            recipient_code,
            amount,
            reason: format!("Payment for order {}", order.id),
            reference: transfer_reference(order.id, seller_id, Utc::now()),
        };
        match self.gateway.transfer(request).await {
            Ok(receipt) => PayoutResult::success(seller_id, amount, receipt.transfer_code, mode),
            Err(e) => PayoutResult::failure(seller_id, amount, e.to_string(), mode),
        }
    }

    pub async fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        Ok(self.db.fetch_orders_for_user(user_id).await?)
    }

    /// Orders containing the seller's products. Only the seller's own line items are included.
    pub async fn orders_for_seller(
        &self,
        seller_id: i64,
        status: Option<PaymentStatus>,
    ) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_seller(seller_id, status).await?;
        Ok(orders.iter().map(|o| o.filtered_for_seller(seller_id)).collect())
    }

    /// Users may only see their own orders, and sellers only orders that contain their products.
    pub async fn order_details(&self, order_id: i64, viewer: OrderViewer) -> Result<OrderDetails, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let allowed = match viewer {
            OrderViewer::User(id) => order.is_owned_by_user(id),
            OrderViewer::Seller(id) => order.has_items_from_seller(id),
            OrderViewer::Admin => true,
        };
        if !allowed {
            return Err(OrderFlowError::NotAuthorized);
        }
        self.with_products(order).await
    }

    /// Like [`Self::order_details`], but with the line items of other sellers removed.
    pub async fn seller_order_details(&self, seller_id: i64, order_id: i64) -> Result<OrderDetails, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if !order.has_items_from_seller(seller_id) {
            return Err(OrderFlowError::NotAuthorized);
        }
        self.with_products(order.filtered_for_seller(seller_id)).await
    }

    /// Attaches the current catalog details of every product in the order.
    pub async fn with_products(&self, order: Order) -> Result<OrderDetails, OrderFlowError> {
        let mut products: Vec<ProductSummary> = Vec::with_capacity(order.items.len());
        for item in &order.items {
            if products.iter().any(|p| p.product_id == item.product_id) {
                continue;
            }
            if let Some(product) = self.db.fetch_product(item.product_id).await? {
                products.push(product.into());
            }
        }
        Ok(OrderDetails { order, products })
    }

    /// Fails gateway orders that have been waiting for payment since before `cutoff`. Returns the expired orders.
    pub async fn expire_stale_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderFlowError> {
        let stale = self.db.fetch_stale_pending_orders(cutoff).await?;
        let mut expired = Vec::with_capacity(stale.len());
        for order in stale {
            match self.db.mark_order_failed(order.id).await {
                Ok(order) => {
                    info!("🔄️ Order #{} expired without payment", order.id);
                    let event = OrderFailedEvent::new(order.clone(), "Payment not received");
                    self.producers.publish_order_failed(event).await;
                    expired.push(order);
                },
                // Paid in the meantime
                Err(OrderManagementError::IllegalTransition { id, .. }) => {
                    debug!("🔄️ Order #{id} changed status before it could be expired");
                },
                Err(e) => return Err(e.into()),
            }
        }
        Ok(expired)
    }

    async fn buyer_email(&self, user_id: Option<i64>, request: &CheckoutRequest) -> Result<String, OrderFlowError> {
        let account_email = match user_id {
            Some(id) => self.db.fetch_user(id).await?.map(|u| u.email),
            None => None,
        };
        let email = account_email.unwrap_or_else(|| request.shipping_info.email.clone());
        Ok(normalize_email(&email))
    }
}
